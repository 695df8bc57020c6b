//! Help command - lists available commands.

use async_trait::async_trait;
use chat_client::Embed;
use dispatcher::{Command, CommandContext, CommandError, CommandInfo, Response};
use scope_store::{ScopeState, SettingsStore};

pub struct HelpCommand {
    commands: Vec<CommandInfo>,
    settings: SettingsStore,
    global_prefix: String,
}

impl HelpCommand {
    pub fn new(
        mut commands: Vec<CommandInfo>,
        settings: SettingsStore,
        global_prefix: impl Into<String>,
    ) -> Self {
        commands.push(CommandInfo {
            name: "help".into(),
            aliases: Vec::new(),
            description: "Show this message".into(),
        });
        commands.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            commands,
            settings,
            global_prefix: global_prefix.into(),
        }
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn aliases(&self) -> &[&str] {
        &["commands"]
    }

    fn description(&self) -> &str {
        "Show this message"
    }

    async fn execute(
        &self,
        _args: &[String],
        ctx: &CommandContext,
        _state: &mut ScopeState,
    ) -> Result<Response, CommandError> {
        let settings = self.settings.scope(ctx.scope_id()).await;
        let prefix = settings.active_prefix(&self.global_prefix);

        let lines: Vec<String> = self
            .commands
            .iter()
            .map(|c| format!("`{}{}` - {}", prefix, c.name, c.description))
            .collect();

        Ok(Response::reply(
            Embed::new()
                .title("Commands")
                .description(lines.join("\n"))
                .footer("Mention the bot to ask a question."),
        ))
    }
}
