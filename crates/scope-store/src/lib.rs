//! Per-scope state, settings and persistence.
//!
//! Every scope (a guild, or a direct-message channel) owns one
//! [`ScopeState`] behind its own lock. The [`ScopeRegistry`] hands those
//! locks out and creates state lazily under a separate registry lock.

mod error;
mod persist;
mod settings;
mod store;
mod types;

pub use error::StoreError;
pub use persist::{PersistedState, StateFile};
pub use settings::*;
pub use store::{ScopeHandle, ScopeRegistry};
pub use types::*;
