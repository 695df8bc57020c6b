//! Guild bot: configuration, built-in commands and event intake around the
//! message dispatcher.

pub mod commands;
pub mod config;
pub mod error;
pub mod intake;

pub use config::Config;
pub use error::{AppError, AppResult};
