//! Per-scope and per-user settings.

use crate::error::StoreError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Settings for one scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeSettings {
    /// Scope-specific command prefix. Empty means the global prefix applies.
    #[serde(default)]
    pub prefix: String,

    /// Role-assignment triggers.
    #[serde(default)]
    pub role_me: Vec<RoleMe>,

    #[serde(default)]
    pub swear_filter: SwearFilter,

    #[serde(default)]
    pub logging: LogSettings,
}

impl ScopeSettings {
    /// The prefix commands must start with in this scope.
    pub fn active_prefix<'a>(&'a self, global: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            global
        } else {
            &self.prefix
        }
    }
}

/// A set of trigger phrases that grant roles to whoever says them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMe {
    pub triggers: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
    pub roles: Vec<String>,
}

impl RoleMe {
    /// Whether the whole message equals one of the triggers.
    pub fn matches(&self, content: &str) -> bool {
        if self.case_sensitive {
            self.triggers.iter().any(|t| t == content)
        } else {
            let content = content.to_lowercase();
            self.triggers.iter().any(|t| t.to_lowercase() == content)
        }
    }
}

/// Profanity filter configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwearFilter {
    #[serde(default)]
    pub enabled: bool,

    /// Words or regular expressions, matched case-insensitively on word
    /// boundaries.
    #[serde(default)]
    pub words: Vec<String>,

    /// How long the warning stays up. Zero keeps it.
    #[serde(default, with = "humantime_serde")]
    pub warning_delete_timeout: Duration,
}

impl SwearFilter {
    /// Check content against the word list, returning every match.
    pub fn check(&self, content: &str) -> Result<Vec<String>, StoreError> {
        let mut found = Vec::new();

        for word in &self.words {
            let regex = compile_word(word)?;
            if let Some(m) = regex.captures(content).and_then(|c| c.get(1)) {
                found.push(m.as_str().to_string());
            }
        }

        Ok(found)
    }

    /// Validate that a word compiles before it is added to the list.
    pub fn validate_word(word: &str) -> Result<(), StoreError> {
        compile_word(word).map(|_| ())
    }
}

/// Wrap a word so it only matches on its own. `\b` needs a word character
/// on the inside, so an edge that starts or ends with a symbol is bounded
/// by a non-word character or the end of the text instead.
fn compile_word(word: &str) -> Result<Regex, StoreError> {
    let leading = if word.starts_with(is_word_char) {
        r"\b"
    } else {
        r"(?:^|\W)"
    };
    let trailing = if word.ends_with(is_word_char) {
        r"\b"
    } else {
        r"(?:\W|$)"
    };

    Regex::new(&format!(r"(?i){}({}){}", leading, word, trailing)).map_err(|e| {
        StoreError::InvalidPattern {
            pattern: word.to_string(),
            reason: e.to_string(),
        }
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Moderation logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub events: LogEvents,
}

impl LogSettings {
    /// Channel to post swear-detect events to, if that event is logged.
    pub fn swear_detect_channel(&self) -> Option<&str> {
        if self.enabled && self.events.swear_detect {
            self.channel_id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvents {
    #[serde(default)]
    pub swear_detect: bool,
}

/// Settings for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Never keep a continuation token for this user.
    #[serde(default)]
    pub forget_conversations: bool,
}

/// Store of scope and user settings, created lazily with defaults.
#[derive(Clone, Default)]
pub struct SettingsStore {
    scopes: Arc<RwLock<HashMap<String, ScopeSettings>>>,
    users: Arc<RwLock<HashMap<String, UserSettings>>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from persisted settings.
    pub fn from_persisted(
        scopes: HashMap<String, ScopeSettings>,
        users: HashMap<String, UserSettings>,
    ) -> Self {
        Self {
            scopes: Arc::new(RwLock::new(scopes)),
            users: Arc::new(RwLock::new(users)),
        }
    }

    /// Get a scope's settings, creating defaults on first use.
    pub async fn scope(&self, scope_id: &str) -> ScopeSettings {
        if let Some(settings) = self.scopes.read().await.get(scope_id) {
            return settings.clone();
        }

        let mut scopes = self.scopes.write().await;
        scopes
            .entry(scope_id.to_string())
            .or_insert_with(|| {
                debug!("Created default settings for scope {}", scope_id);
                ScopeSettings::default()
            })
            .clone()
    }

    /// Modify a scope's settings in place.
    pub async fn update_scope<F, R>(&self, scope_id: &str, f: F) -> R
    where
        F: FnOnce(&mut ScopeSettings) -> R,
    {
        let mut scopes = self.scopes.write().await;
        f(scopes.entry(scope_id.to_string()).or_default())
    }

    /// Get a user's settings, creating defaults on first use.
    pub async fn user(&self, user_id: &str) -> UserSettings {
        if let Some(settings) = self.users.read().await.get(user_id) {
            return settings.clone();
        }

        let mut users = self.users.write().await;
        users.entry(user_id.to_string()).or_default().clone()
    }

    /// Modify a user's settings in place.
    pub async fn update_user<F, R>(&self, user_id: &str, f: F) -> R
    where
        F: FnOnce(&mut UserSettings) -> R,
    {
        let mut users = self.users.write().await;
        f(users.entry(user_id.to_string()).or_default())
    }

    /// Copy out all settings for persistence.
    pub async fn snapshot(
        &self,
    ) -> (
        HashMap<String, ScopeSettings>,
        HashMap<String, UserSettings>,
    ) {
        let scopes = self.scopes.read().await.clone();
        let users = self.users.read().await.clone();
        (scopes, users)
    }
}
