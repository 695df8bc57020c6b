//! Message dispatcher.
//!
//! Classifies every inbound message into one response path (role triggers,
//! prefixed commands, the profanity filter, or a mention-triggered query),
//! computes the response and delivers it so that edits of a message update
//! the bot's earlier reply instead of adding a new one.

mod command;
mod correlator;
mod dispatcher;
mod error;
mod fallback;
mod picker;
mod response;
mod tokenizer;
mod triggers;

pub use command::{Command, CommandContext, CommandInfo, CommandRegistry};
pub use correlator::{Correlator, Delivery};
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::{CommandError, DispatchError};
pub use fallback::FallbackChain;
pub use picker::Picker;
pub use response::{ErrorKind, Response};
pub use tokenizer::tokenize;
pub use triggers::{
    match_prefix, matched_role_rules, strip_mention, CommandInvocation, NlpRule, TriggerRule,
};
