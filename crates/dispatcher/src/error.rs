//! Dispatcher error types.

use thiserror::Error;

/// Errors raised while compiling trigger and NLP rules.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors a command handler can return.
///
/// The dispatcher never shows these to users; they become a generic
/// "Command Error" reply.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
