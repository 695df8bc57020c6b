//! Ping command - liveness check.

use async_trait::async_trait;
use chat_client::Embed;
use dispatcher::{Command, CommandContext, CommandError, Response};
use scope_store::ScopeState;

pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn name(&self) -> &str {
        "ping"
    }

    fn description(&self) -> &str {
        "Check that the bot is responding"
    }

    async fn execute(
        &self,
        _args: &[String],
        _ctx: &CommandContext,
        _state: &mut ScopeState,
    ) -> Result<Response, CommandError> {
        Ok(Response::reply(Embed::new().title("Pong!")))
    }
}
