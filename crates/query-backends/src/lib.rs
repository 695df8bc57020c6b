//! Query backends consulted by the fallback chain.

mod error;
mod http;
mod types;

pub use error::QueryError;
pub use http::HttpQueryBackend;
pub use types::*;
