//! Swear filter command - configures the profanity filter for one scope.

use super::{arguments, Admins};
use async_trait::async_trait;
use chat_client::Embed;
use dispatcher::{Command, CommandContext, CommandError, Response};
use humantime_serde::re::humantime;
use scope_store::{ScopeState, SettingsStore, SwearFilter};
use std::time::Duration;
use tracing::info;

const USAGE: &str = "Usage: `swearfilter [on|off|add <word>|remove <word>|timeout <duration>]`";

pub struct SwearFilterCommand {
    settings: SettingsStore,
    admins: Admins,
}

impl SwearFilterCommand {
    pub fn new(settings: SettingsStore, admins: Admins) -> Self {
        Self { settings, admins }
    }

    fn status(filter: &SwearFilter) -> Embed {
        let timeout = if filter.warning_delete_timeout.is_zero() {
            "never".to_string()
        } else {
            humantime::format_duration(filter.warning_delete_timeout).to_string()
        };

        Embed::new()
            .title("Swear Filter")
            .field("Enabled", if filter.enabled { "yes" } else { "no" })
            .field("Words", filter.words.len().to_string())
            .field("Warning Removed After", timeout)
            .inline_all()
    }
}

#[async_trait]
impl Command for SwearFilterCommand {
    fn name(&self) -> &str {
        "swearfilter"
    }

    fn description(&self) -> &str {
        "Configure the swear filter"
    }

    async fn execute(
        &self,
        args: &[String],
        ctx: &CommandContext,
        _state: &mut ScopeState,
    ) -> Result<Response, CommandError> {
        let scope_id = ctx.scope_id();
        let args = arguments(args);
        let action = args.first().map(|a| a.to_lowercase());
        let value = args.get(1).copied().unwrap_or("");

        if !matches!(action.as_deref(), None | Some("status")) && !self.admins.allows(ctx) {
            return Ok(self.admins.denied(ctx));
        }

        let filter = match action.as_deref() {
            None | Some("status") => self.settings.scope(scope_id).await.swear_filter,
            Some("on") | Some("off") => {
                let enabled = action.as_deref() == Some("on");
                info!(scope = %scope_id, enabled, "Swear filter toggled");
                self.settings
                    .update_scope(scope_id, |s| {
                        s.swear_filter.enabled = enabled;
                        s.swear_filter.clone()
                    })
                    .await
            }
            Some("add") => {
                if value.is_empty() {
                    return Ok(usage());
                }
                if let Err(e) = SwearFilter::validate_word(value) {
                    return Ok(Response::reply(Embed::error(
                        "Swear Filter Error",
                        e.to_string(),
                    )));
                }
                self.settings
                    .update_scope(scope_id, |s| {
                        if !s.swear_filter.words.iter().any(|w| w == value) {
                            s.swear_filter.words.push(value.to_string());
                        }
                        s.swear_filter.clone()
                    })
                    .await
            }
            Some("remove") => {
                let removed = self
                    .settings
                    .update_scope(scope_id, |s| {
                        let before = s.swear_filter.words.len();
                        s.swear_filter.words.retain(|w| w != value);
                        before != s.swear_filter.words.len()
                    })
                    .await;
                if !removed {
                    return Ok(Response::reply(Embed::error(
                        "Swear Filter Error",
                        format!("``{}`` is not in the word list.", value),
                    )));
                }
                self.settings.scope(scope_id).await.swear_filter
            }
            Some("timeout") => {
                let Some(timeout) = parse_timeout(value) else {
                    return Ok(usage());
                };
                self.settings
                    .update_scope(scope_id, |s| {
                        s.swear_filter.warning_delete_timeout = timeout;
                        s.swear_filter.clone()
                    })
                    .await
            }
            Some(_) => return Ok(usage()),
        };

        Ok(Response::reply(Self::status(&filter)))
    }
}

fn usage() -> Response {
    Response::reply(Embed::error("Swear Filter Error", USAGE))
}

/// Accept whole seconds or a humantime duration such as `1m 30s`.
fn parse_timeout(value: &str) -> Option<Duration> {
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    humantime::parse_duration(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{args, context};

    /// The test context's author is `u1`.
    fn owner() -> Admins {
        Admins::new(Some("u1".into()), Vec::new())
    }

    async fn run(command: &SwearFilterCommand, values: &[&str]) -> Response {
        let mut state = ScopeState::new("g1");
        command
            .execute(&args(values), &context("swearfilter", Some("g1")), &mut state)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_configure_filter() {
        let settings = SettingsStore::new();
        let command = SwearFilterCommand::new(settings.clone(), owner());

        run(&command, &["on"]).await;
        run(&command, &["add", "darn"]).await;
        run(&command, &["add", "darn"]).await;
        run(&command, &["add", "heck"]).await;
        run(&command, &["timeout", "5"]).await;

        let filter = settings.scope("g1").await.swear_filter;
        assert!(filter.enabled);
        assert_eq!(filter.words, vec!["darn".to_string(), "heck".to_string()]);
        assert_eq!(filter.warning_delete_timeout, Duration::from_secs(5));

        run(&command, &["remove", "darn"]).await;
        run(&command, &["OFF"]).await;

        let filter = settings.scope("g1").await.swear_filter;
        assert!(!filter.enabled);
        assert_eq!(filter.words, vec!["heck".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_word_rejected() {
        let settings = SettingsStore::new();
        let command = SwearFilterCommand::new(settings.clone(), owner());

        let response = run(&command, &["add", "(broken"]).await;

        assert!(matches!(response, Response::Reply(ref e) if e.title.as_deref() == Some("Swear Filter Error")));
        assert!(settings.scope("g1").await.swear_filter.words.is_empty());
    }

    #[tokio::test]
    async fn test_status() {
        let command = SwearFilterCommand::new(SettingsStore::new(), Admins::default());

        let Response::Reply(embed) = run(&command, &[]).await else {
            panic!("Expected reply");
        };
        assert_eq!(embed.fields[0].value, "no");
        assert_eq!(embed.fields[2].value, "never");
    }

    #[tokio::test]
    async fn test_non_admin_cannot_disable_filter() {
        let settings = SettingsStore::new();
        settings
            .update_scope("g1", |s| s.swear_filter.enabled = true)
            .await;
        let admins = Admins::new(Some("owner".into()), vec!["mods".into()]);
        let command = SwearFilterCommand::new(settings.clone(), admins);

        let response = run(&command, &["off"]).await;

        assert!(matches!(response, Response::Reply(ref e) if e.title.as_deref() == Some("Permission Error")));
        assert!(settings.scope("g1").await.swear_filter.enabled);

        // Anyone may look at the status.
        let Response::Reply(embed) = run(&command, &["status"]).await else {
            panic!("Expected reply");
        };
        assert_eq!(embed.fields[0].value, "yes");
    }

    #[tokio::test]
    async fn test_blank_tokens_ignored() {
        let settings = SettingsStore::new();
        let command = SwearFilterCommand::new(settings.clone(), owner());

        run(&command, &["add", "", "darn"]).await;
        let Response::Reply(embed) = run(&command, &[""]).await else {
            panic!("Expected reply");
        };

        assert_eq!(settings.scope("g1").await.swear_filter.words, vec!["darn".to_string()]);
        assert_eq!(embed.title.as_deref(), Some("Swear Filter"));
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_timeout("1m 30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_timeout("soon"), None);
    }
}
