//! Scope state types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Correlation between an inbound message and the bot's reply to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCorrelation {
    /// ID of the reply, absent until the reply is first sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_message_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl QueryCorrelation {
    pub fn new() -> Self {
        Self {
            response_message_id: None,
            created_at: Utc::now(),
        }
    }
}

impl Default for QueryCorrelation {
    fn default() -> Self {
        Self::new()
    }
}

/// Persisted form of a [`ScopeState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSnapshot {
    /// Originating message ID -> reply correlation.
    #[serde(default)]
    pub queries: HashMap<String, QueryCorrelation>,
    /// User ID -> continuation token.
    #[serde(default)]
    pub continuations: HashMap<String, String>,
}

/// Mutable state owned by one scope.
///
/// Only ever touched while the scope's lock is held.
#[derive(Debug, Clone)]
pub struct ScopeState {
    scope_id: String,
    queries: HashMap<String, QueryCorrelation>,
    continuations: HashMap<String, String>,
}

impl ScopeState {
    pub fn new(scope_id: impl Into<String>) -> Self {
        Self {
            scope_id: scope_id.into(),
            queries: HashMap::new(),
            continuations: HashMap::new(),
        }
    }

    /// Rebuild state from a persisted snapshot.
    pub fn from_snapshot(scope_id: impl Into<String>, snapshot: ScopeSnapshot) -> Self {
        Self {
            scope_id: scope_id.into(),
            queries: snapshot.queries,
            continuations: snapshot.continuations,
        }
    }

    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    /// Get the correlation entry for an originating message.
    pub fn correlation(&self, message_id: &str) -> Option<&QueryCorrelation> {
        self.queries.get(message_id)
    }

    /// Get the reply ID previously sent for an originating message.
    pub fn reply_for(&self, message_id: &str) -> Option<&str> {
        self.queries
            .get(message_id)
            .and_then(|q| q.response_message_id.as_deref())
    }

    /// Ensure a correlation entry exists for a message.
    pub fn track_query(&mut self, message_id: &str) -> &mut QueryCorrelation {
        self.queries.entry(message_id.to_string()).or_default()
    }

    /// Record the reply sent for a message.
    ///
    /// An entry that already holds a reply ID keeps it.
    pub fn record_reply(&mut self, message_id: &str, reply_id: &str) {
        let entry = self.track_query(message_id);
        if entry.response_message_id.is_none() {
            entry.response_message_id = Some(reply_id.to_string());
        }
    }

    /// Drop the reply ID recorded for a message, keeping the entry, so the
    /// next delivery sends a fresh reply.
    pub fn forget_reply(&mut self, message_id: &str) -> Option<String> {
        self.queries
            .get_mut(message_id)
            .and_then(|q| q.response_message_id.take())
    }

    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    /// Get a user's continuation token.
    pub fn continuation(&self, user_id: &str) -> Option<&str> {
        self.continuations.get(user_id).map(String::as_str)
    }

    /// Store a user's continuation token, replacing any previous one.
    pub fn set_continuation(&mut self, user_id: &str, token: impl Into<String>) {
        self.continuations.insert(user_id.to_string(), token.into());
    }

    /// Drop a user's continuation token.
    pub fn clear_continuation(&mut self, user_id: &str) -> bool {
        self.continuations.remove(user_id).is_some()
    }

    pub fn snapshot(&self) -> ScopeSnapshot {
        ScopeSnapshot {
            queries: self.queries.clone(),
            continuations: self.continuations.clone(),
        }
    }
}
