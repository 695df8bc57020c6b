//! Prefix command - sets the command prefix for one scope.

use super::{arguments, Admins};
use async_trait::async_trait;
use chat_client::Embed;
use dispatcher::{Command, CommandContext, CommandError, Response};
use scope_store::{ScopeState, SettingsStore};
use tracing::info;

pub struct PrefixCommand {
    settings: SettingsStore,
    global_prefix: String,
    admins: Admins,
}

impl PrefixCommand {
    pub fn new(settings: SettingsStore, global_prefix: impl Into<String>, admins: Admins) -> Self {
        Self {
            settings,
            global_prefix: global_prefix.into(),
            admins,
        }
    }
}

#[async_trait]
impl Command for PrefixCommand {
    fn name(&self) -> &str {
        "prefix"
    }

    fn description(&self) -> &str {
        "Show or change the command prefix (`prefix <new>` or `prefix reset`)"
    }

    async fn execute(
        &self,
        args: &[String],
        ctx: &CommandContext,
        _state: &mut ScopeState,
    ) -> Result<Response, CommandError> {
        let scope_id = ctx.scope_id();

        let Some(arg) = arguments(args).first().map(|a| a.to_string()) else {
            let settings = self.settings.scope(scope_id).await;
            return Ok(Response::reply(Embed::new().title("Prefix").description(format!(
                "The current prefix is `{}`.",
                settings.active_prefix(&self.global_prefix)
            ))));
        };

        if !self.admins.allows(ctx) {
            return Ok(self.admins.denied(ctx));
        }

        if arg.eq_ignore_ascii_case("reset") {
            self.settings
                .update_scope(scope_id, |s| s.prefix.clear())
                .await;
            info!(scope = %scope_id, "Prefix reset");
            return Ok(Response::reply(Embed::new().title("Prefix").description(format!(
                "Prefix reset to `{}`.",
                self.global_prefix
            ))));
        }

        if arg.trim().is_empty() {
            return Ok(Response::reply(Embed::error(
                "Prefix Error",
                "The prefix cannot be blank.",
            )));
        }

        self.settings
            .update_scope(scope_id, |s| s.prefix = arg.clone())
            .await;
        info!(scope = %scope_id, prefix = %arg, "Prefix changed");

        Ok(Response::reply(
            Embed::new()
                .title("Prefix")
                .description(format!("Prefix set to `{}`.", arg)),
        ))
    }
}
