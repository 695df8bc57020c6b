//! Per-event orchestration.

use crate::command::{CommandContext, CommandRegistry};
use crate::correlator::{Correlator, Delivery};
use crate::fallback::FallbackChain;
use crate::response::Response;
use crate::tokenizer::tokenize;
use crate::triggers::{match_prefix, matched_role_rules, strip_mention};
use chat_client::{ChatTransport, Embed, InboundMessage, Member};
use futures::FutureExt;
use scope_store::{ScopeRegistry, ScopeSettings, ScopeState, SettingsStore, StateFile};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Colour of moderation log embeds.
const LOG_COLOR: u32 = 0x1C_1C_1C;

/// Dispatcher settings that do not vary per scope.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Prefix used where a scope has not set its own.
    pub prefix: String,
    /// Operator who receives moderation-path errors.
    pub owner_id: Option<String>,
    pub send_typing: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            prefix: "!".into(),
            owner_id: None,
            send_typing: false,
        }
    }
}

/// Routes every inbound message to at most one response path.
///
/// Each event holds its scope's lock from classification to persistence,
/// so events within a scope are handled one at a time while different
/// scopes proceed independently.
pub struct Dispatcher {
    config: DispatcherConfig,
    transport: Arc<dyn ChatTransport>,
    scopes: ScopeRegistry,
    settings: SettingsStore,
    commands: Arc<CommandRegistry>,
    chain: FallbackChain,
    correlator: Correlator,
    state_file: Arc<StateFile>,
}

impl Dispatcher {
    pub fn new(
        config: DispatcherConfig,
        transport: Arc<dyn ChatTransport>,
        commands: Arc<CommandRegistry>,
        chain: FallbackChain,
    ) -> Self {
        let correlator = Correlator::new(transport.clone()).with_typing(config.send_typing);
        Self {
            config,
            transport,
            scopes: ScopeRegistry::new(),
            settings: SettingsStore::new(),
            commands,
            chain,
            correlator,
            state_file: Arc::new(StateFile::memory()),
        }
    }

    /// Use previously restored scope state.
    pub fn with_scopes(mut self, scopes: ScopeRegistry) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_settings(mut self, settings: SettingsStore) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_state_file(mut self, state_file: Arc<StateFile>) -> Self {
        self.state_file = state_file;
        self
    }

    pub fn scopes(&self) -> &ScopeRegistry {
        &self.scopes
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Handle one inbound message on a new task.
    pub fn spawn(self: &Arc<Self>, message: InboundMessage, updated: bool) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(&message, updated).await })
    }

    /// Handle one inbound message.
    ///
    /// Never fails: errors are logged, and a panic while handling the
    /// message is caught here and ends only this event.
    pub async fn dispatch(&self, message: &InboundMessage, updated: bool) {
        if message.content.is_empty() || message.author.bot {
            return;
        }

        let result = AssertUnwindSafe(self.handle(message, updated))
            .catch_unwind()
            .await;

        if let Err(panic) = result {
            error!(
                scope = %message.scope_id(),
                message = %message.id,
                "Panic while handling message: {}",
                panic_message(&*panic)
            );
        }
    }

    #[instrument(skip_all, fields(scope = %message.scope_id(), message = %message.id))]
    async fn handle(&self, message: &InboundMessage, updated: bool) {
        let scope_id = message.scope_id();
        let scope = self.scopes.scope(scope_id).await;
        let mut state = scope.lock().await;

        let settings = self.settings.scope(scope_id).await;
        let content = message.content.as_str();

        if let Some(guild_id) = &message.guild_id {
            self.assign_roles(&settings, guild_id, message).await;
        }

        let prefix = settings.active_prefix(&self.config.prefix);
        let response = if let Some(text) = match_prefix(content, prefix) {
            log_message(message, updated);
            self.run_command(text, prefix, message, updated, &mut state)
                .await
        } else {
            if settings.swear_filter.enabled && self.moderate(&settings, message).await {
                return;
            }

            if !self.chain.is_enabled() {
                return;
            }
            let Some(query) = strip_mention(content, self.transport.bot_user_id()) else {
                return;
            };

            log_message(message, updated);
            let user = self.settings.user(&message.author.id).await;
            let ctx = self.context(message, updated).await;
            self.chain.resolve(&query, &ctx, &mut state, &user).await
        };

        let delivery = self
            .correlator
            .deliver(response, &message.channel_id, &message.id, &mut state)
            .await;

        if delivery == Delivery::Skipped {
            return;
        }

        if let Err(e) = self
            .state_file
            .save(scope_id, state.snapshot(), &self.settings)
            .await
        {
            error!("Failed to save state: {}", e);
        }
    }

    async fn run_command(
        &self,
        text: &str,
        prefix: &str,
        message: &InboundMessage,
        updated: bool,
        state: &mut ScopeState,
    ) -> Response {
        let tokens = tokenize(text);
        let Some((name, args)) = tokens.split_first() else {
            return Response::NoAction;
        };
        if name.is_empty() {
            return Response::NoAction;
        }

        let ctx = self
            .context(message, updated)
            .await
            .with_command(name.as_str(), prefix);
        self.commands.invoke(name, args, &ctx, state).await
    }

    async fn context(&self, message: &InboundMessage, updated: bool) -> CommandContext {
        CommandContext::new(message.clone(), updated).with_member(self.member(message).await)
    }

    async fn member(&self, message: &InboundMessage) -> Option<Member> {
        let guild_id = message.guild_id.as_deref()?;
        match self.transport.member(guild_id, &message.author.id).await {
            Ok(member) => Some(member),
            Err(e) => {
                debug!("Could not resolve member {}: {}", message.author.id, e);
                None
            }
        }
    }

    /// Grant the roles of every rule whose trigger equals the message.
    async fn assign_roles(&self, settings: &ScopeSettings, guild_id: &str, message: &InboundMessage) {
        for rule in matched_role_rules(&settings.role_me, &message.content) {
            for role in &rule.roles {
                match self
                    .transport
                    .add_role(guild_id, &message.author.id, role)
                    .await
                {
                    Ok(()) => info!(user = %message.author.id, role = %role, "Assigned role"),
                    Err(e) => warn!(user = %message.author.id, role = %role, "Failed to assign role: {}", e),
                }
            }
        }
    }

    /// Run the profanity filter. Returns true when the message was caught
    /// and processing must stop.
    async fn moderate(&self, settings: &ScopeSettings, message: &InboundMessage) -> bool {
        let swears = match settings.swear_filter.check(&message.content) {
            Ok(swears) => swears,
            Err(e) => {
                warn!("Swear filter check failed: {}", e);
                self.report_to_owner(&format!(
                    "An error occurred with the swear filter: ``{}``",
                    e
                ))
                .await;
                return false;
            }
        };

        if swears.is_empty() {
            return false;
        }

        info!(user = %message.author.id, "Swear filter matched {} word(s)", swears.len());

        if let Some(log_channel) = settings.logging.swear_detect_channel() {
            let embed = Embed::new()
                .title("Logging Event - Swear Detect")
                .description("One or more swears were detected in a message.")
                .field("Offending User", format!("<@{}>", message.author.id))
                .field("Source Channel", format!("<#{}>", message.channel_id))
                .field("Swears Detected", swears.join(", "))
                .field("Offending Message", message.content.clone())
                .inline_all()
                .color(LOG_COLOR);
            if let Err(e) = self.transport.send_embed(log_channel, &embed).await {
                warn!("Failed to log swear event: {}", e);
            }
        }

        if let Err(e) = self
            .transport
            .delete_message(&message.channel_id, &message.id)
            .await
        {
            warn!("Failed to delete offending message: {}", e);
        }

        let warning = format!(":warning: <@{}>, please watch your language!", message.author.id);
        let warning_id = match self.transport.send_text(&message.channel_id, &warning).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to send swear warning: {}", e);
                return true;
            }
        };

        // Holds the scope lock until the warning is gone.
        let timeout = settings.swear_filter.warning_delete_timeout;
        if !timeout.is_zero() {
            tokio::time::sleep(timeout).await;
            if let Err(e) = self
                .transport
                .delete_message(&message.channel_id, &warning_id)
                .await
            {
                warn!("Failed to delete swear warning: {}", e);
            }
        }

        true
    }

    async fn report_to_owner(&self, text: &str) {
        let Some(owner_id) = &self.config.owner_id else {
            return;
        };

        let channel = match self.transport.direct_channel(owner_id).await {
            Ok(channel) => channel,
            Err(e) => {
                error!("Failed to open a direct channel with the bot owner: {}", e);
                return;
            }
        };

        if let Err(e) = self.transport.send_text(&channel, text).await {
            error!("Failed to report to the bot owner: {}", e);
        }
    }
}

/// Log an inbound message the way it would read in chat.
fn log_message(message: &InboundMessage, updated: bool) {
    let event = if updated { "Updated" } else { "New" };
    let scope = message
        .guild_name
        .as_deref()
        .unwrap_or_else(|| message.scope_id());
    let channel = message
        .channel_name
        .as_deref()
        .unwrap_or(&message.channel_id);
    let author = match &message.author.discriminator {
        Some(d) => format!("{}#{}", message.author.username, d),
        None => message.author.username.clone(),
    };

    if message.content.contains('\n') {
        debug!("[{}][{} - #{}] @{}:\n{}", event, scope, channel, author, message.content);
    } else {
        debug!("[{}][{} - #{}] @{}: {}", event, scope, channel, author, message.content);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        return s;
    }
    if let Some(s) = panic.downcast_ref::<String>() {
        return s.as_str();
    }
    "unknown panic"
}
