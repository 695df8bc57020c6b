//! Forget command - drops and stops keeping conversation context.

use async_trait::async_trait;
use chat_client::Embed;
use dispatcher::{Command, CommandContext, CommandError, Response};
use scope_store::{ScopeState, SettingsStore};
use tracing::info;

pub struct ForgetCommand {
    settings: SettingsStore,
}

impl ForgetCommand {
    pub fn new(settings: SettingsStore) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Command for ForgetCommand {
    fn name(&self) -> &str {
        "forget"
    }

    fn description(&self) -> &str {
        "Toggle whether the bot remembers your follow-up questions"
    }

    async fn execute(
        &self,
        _args: &[String],
        ctx: &CommandContext,
        state: &mut ScopeState,
    ) -> Result<Response, CommandError> {
        let user_id = ctx.author().id.as_str();
        let cleared = state.clear_continuation(user_id);

        let forget = self
            .settings
            .update_user(user_id, |u| {
                u.forget_conversations = !u.forget_conversations;
                u.forget_conversations
            })
            .await;

        info!(user = %user_id, forget, "Conversation memory toggled");

        let mut description = if forget {
            String::from("I will no longer remember our conversations.")
        } else {
            String::from("I will remember our conversations again.")
        };
        if cleared {
            description.push_str(" Your current conversation has been cleared.");
        }

        Ok(Response::reply(
            Embed::new().title("Conversations").description(description),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;

    #[tokio::test]
    async fn test_forget_toggles_and_clears() {
        let settings = SettingsStore::new();
        let command = ForgetCommand::new(settings.clone());
        let ctx = context("forget", Some("g1"));
        let mut state = ScopeState::new("g1");
        state.set_continuation("u1", "token");
        state.set_continuation("u2", "other");

        command.execute(&[], &ctx, &mut state).await.unwrap();
        assert!(settings.user("u1").await.forget_conversations);
        assert!(state.continuation("u1").is_none());
        assert_eq!(state.continuation("u2"), Some("other"));

        let response = command.execute(&[], &ctx, &mut state).await.unwrap();
        assert!(!settings.user("u1").await.forget_conversations);
        assert_eq!(
            response,
            Response::reply(
                Embed::new()
                    .title("Conversations")
                    .description("I will remember our conversations again.")
            )
        );
    }
}
