//! Who may change scope settings.

use chat_client::Embed;
use dispatcher::{CommandContext, Response};
use tracing::warn;

/// Bot owner plus guild roles allowed to run settings-changing commands.
#[derive(Debug, Clone, Default)]
pub struct Admins {
    owner_id: Option<String>,
    roles: Vec<String>,
}

impl Admins {
    pub fn new(owner_id: Option<String>, roles: Vec<String>) -> Self {
        Self { owner_id, roles }
    }

    /// Whether the invoking user may change settings for the scope.
    ///
    /// Direct-message scopes belong to the user in them.
    pub fn allows(&self, ctx: &CommandContext) -> bool {
        if ctx.guild_id().is_none() {
            return true;
        }
        if self.owner_id.as_deref() == Some(ctx.author().id.as_str()) {
            return true;
        }
        ctx.member
            .as_ref()
            .is_some_and(|m| m.roles.iter().any(|r| self.roles.contains(r)))
    }

    /// Reply sent to a user who is not allowed to change a setting.
    pub fn denied(&self, ctx: &CommandContext) -> Response {
        warn!(
            user = %ctx.author().id,
            scope = %ctx.scope_id(),
            command = %ctx.command,
            "Settings change refused"
        );
        Response::reply(Embed::error(
            "Permission Error",
            format!("Only bot admins can use ``{}{}`` to change settings.", ctx.prefix, ctx.command),
        ))
    }
}
