//! Command handlers and the registry that resolves them by name.

use crate::error::CommandError;
use crate::response::{ErrorKind, Response};
use async_trait::async_trait;
use chat_client::{InboundMessage, Member, User};
use scope_store::ScopeState;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything a command knows about the dispatch that invoked it.
///
/// Built fresh for every dispatch.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub message: InboundMessage,
    /// The author's guild membership, when it could be resolved.
    pub member: Option<Member>,
    /// Command name as typed (or as configured, for synthetic dispatches).
    pub command: String,
    /// Prefix the command was invoked with; empty for synthetic dispatches.
    pub prefix: String,
    /// Whether the triggering event was a message edit.
    pub updated_message_event: bool,
}

impl CommandContext {
    pub fn new(message: InboundMessage, updated_message_event: bool) -> Self {
        Self {
            message,
            member: None,
            command: String::new(),
            prefix: String::new(),
            updated_message_event,
        }
    }

    pub fn with_member(mut self, member: Option<Member>) -> Self {
        self.member = member;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.command = command.into();
        self.prefix = prefix.into();
        self
    }

    pub fn channel_id(&self) -> &str {
        &self.message.channel_id
    }

    pub fn scope_id(&self) -> &str {
        self.message.scope_id()
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.message.guild_id.as_deref()
    }

    pub fn author(&self) -> &User {
        &self.message.author
    }
}

/// Command handler trait.
#[async_trait]
pub trait Command: Send + Sync {
    /// Command name (e.g., "help", "ping").
    fn name(&self) -> &str;

    /// Alternative names that resolve to this command.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// One-line description shown by `help`.
    fn description(&self) -> &str;

    /// Execute the command.
    ///
    /// `state` is the invoking scope's state; its lock is held for the
    /// duration of the call.
    async fn execute(
        &self,
        args: &[String],
        ctx: &CommandContext,
        state: &mut ScopeState,
    ) -> Result<Response, CommandError>;
}

/// Name and description of a registered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: String,
}

/// Registry of available commands, keyed by lowercase name.
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Register a command. A later registration under the same name wins.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        let name = command.name().to_lowercase();
        for alias in command.aliases() {
            self.aliases.insert(alias.to_lowercase(), name.clone());
        }
        self.commands.insert(name, command);
    }

    /// Look up a command by name or alias, ignoring case.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Command>> {
        let name = name.to_lowercase();
        let key = self.aliases.get(&name).unwrap_or(&name);
        self.commands.get(key).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Describe every registered command, sorted by name.
    pub fn describe(&self) -> Vec<CommandInfo> {
        let mut infos: Vec<CommandInfo> = self
            .commands
            .iter()
            .map(|(name, command)| CommandInfo {
                name: name.clone(),
                aliases: command.aliases().iter().map(|a| a.to_string()).collect(),
                description: command.description().to_string(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run a command, turning lookup and execution failures into error
    /// replies.
    pub async fn invoke(
        &self,
        name: &str,
        args: &[String],
        ctx: &CommandContext,
        state: &mut ScopeState,
    ) -> Response {
        let Some(command) = self.resolve(name) else {
            debug!("Unknown command: {}", name);
            return Response::Error(ErrorKind::UnknownCommand(name.to_string()));
        };

        match command.execute(args, ctx, state).await {
            Ok(response) => response,
            Err(e) => {
                warn!(command = %name, scope = %ctx.scope_id(), "Command failed: {}", e);
                Response::Error(ErrorKind::CommandFailed(name.to_string()))
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
