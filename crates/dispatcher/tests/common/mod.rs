//! Common test utilities for dispatcher integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chat_client::{ChatError, ChatTransport, Embed, InboundMessage, Member, User};
use dispatcher::{
    Command, CommandContext, CommandError, CommandRegistry, Dispatcher, DispatcherConfig,
    FallbackChain, Response,
};
use query_backends::{QueryAnswer, QueryBackend, QueryError};
use scope_store::ScopeState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

pub const BOT_ID: &str = "42";

/// A call made against the chat transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SendEmbed { channel: String, embed: Embed },
    SendText { channel: String, text: String },
    Edit { channel: String, message: String, embed: Embed },
    Delete { channel: String, message: String },
    AddRole { guild: String, user: String, role: String },
    DirectChannel { user: String },
    Typing { channel: String },
}

/// Chat transport that records every call.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
    fail_sends: AtomicBool,
    deleted_replies: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Make edits of `message_id` fail as if the reply had been deleted.
    pub fn delete_reply(&self, message_id: &str) {
        self.deleted_replies.lock().unwrap().push(message_id.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Embeds sent as new messages, with their channel.
    pub fn sent_embeds(&self) -> Vec<(String, Embed)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendEmbed { channel, embed } => Some((channel, embed)),
                _ => None,
            })
            .collect()
    }

    pub fn sent_texts(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendText { channel, text } => Some((channel, text)),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(String, Embed)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Edit { message, embed, .. } => Some((message, embed)),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn roles_added(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::AddRole { role, .. } => Some(role),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_message_id(&self) -> Result<String, ChatError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChatError::Api {
                status: 500,
                message: "send failed".into(),
            });
        }
        Ok(format!("reply-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    fn bot_user_id(&self) -> &str {
        BOT_ID
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<String, ChatError> {
        self.record(Call::SendEmbed {
            channel: channel_id.into(),
            embed: embed.clone(),
        });
        self.next_message_id()
    }

    async fn send_text(&self, channel_id: &str, text: &str) -> Result<String, ChatError> {
        self.record(Call::SendText {
            channel: channel_id.into(),
            text: text.into(),
        });
        self.next_message_id()
    }

    async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> Result<(), ChatError> {
        self.record(Call::Edit {
            channel: channel_id.into(),
            message: message_id.into(),
            embed: embed.clone(),
        });
        if self.deleted_replies.lock().unwrap().iter().any(|id| id == message_id) {
            return Err(ChatError::NotFound(format!(
                "/channels/{}/messages/{}",
                channel_id, message_id
            )));
        }
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ChatError> {
        self.record(Call::Delete {
            channel: channel_id.into(),
            message: message_id.into(),
        });
        Ok(())
    }

    async fn member(&self, _guild_id: &str, user_id: &str) -> Result<Member, ChatError> {
        Ok(Member {
            user: Some(user(user_id)),
            nick: None,
            roles: Vec::new(),
        })
    }

    async fn direct_channel(&self, user_id: &str) -> Result<String, ChatError> {
        self.record(Call::DirectChannel {
            user: user_id.into(),
        });
        Ok(format!("dm-{}", user_id))
    }

    async fn add_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<(), ChatError> {
        self.record(Call::AddRole {
            guild: guild_id.into(),
            user: user_id.into(),
            role: role_id.into(),
        });
        Ok(())
    }

    async fn typing(&self, channel_id: &str) -> Result<(), ChatError> {
        self.record(Call::Typing {
            channel: channel_id.into(),
        });
        Ok(())
    }
}

/// A query backend call as observed by [`ScriptedBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub text: String,
    pub continuation: Option<String>,
}

/// Continuation-aware backend.
///
/// Queries containing "fail" fail; everything else is answered with
/// `answer: <text>` and continuation `after:<text>`.
#[derive(Default)]
pub struct ScriptedBackend {
    calls: Mutex<Vec<BackendCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn supports_continuation(&self) -> bool {
        true
    }

    async fn query(
        &self,
        text: &str,
        continuation: Option<&str>,
    ) -> Result<QueryAnswer, QueryError> {
        self.calls.lock().unwrap().push(BackendCall {
            text: text.into(),
            continuation: continuation.map(str::to_string),
        });

        if text.contains("fail") {
            return Err(QueryError::NoResult);
        }

        Ok(
            QueryAnswer::new(Embed::new().description(format!("answer: {}", text)))
                .with_continuation(format!("after:{}", text)),
        )
    }
}

/// Backend that tracks how many queries are in flight at once.
pub struct SlowBackend {
    delay: Duration,
    barrier: Option<Barrier>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowBackend {
    /// Each query sleeps for `delay`.
    pub fn sleeping(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            barrier: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Each query waits until `n` queries are in flight together.
    pub fn rendezvous(n: usize) -> Arc<Self> {
        Arc::new(Self {
            delay: Duration::ZERO,
            barrier: Some(Barrier::new(n)),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryBackend for SlowBackend {
    fn name(&self) -> &str {
        "slow"
    }

    async fn query(
        &self,
        text: &str,
        _continuation: Option<&str>,
    ) -> Result<QueryAnswer, QueryError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(QueryAnswer::new(Embed::new().description(text.to_string())))
    }
}

/// Replies with "pong".
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn name(&self) -> &str {
        "ping"
    }

    fn description(&self) -> &str {
        "Check that the bot is alive"
    }

    async fn execute(
        &self,
        _args: &[String],
        _ctx: &CommandContext,
        _state: &mut ScopeState,
    ) -> Result<Response, CommandError> {
        Ok(Response::reply(Embed::new().description("pong")))
    }
}

/// Replies with its arguments, one field per argument.
pub struct ArgsCommand;

#[async_trait]
impl Command for ArgsCommand {
    fn name(&self) -> &str {
        "args"
    }

    fn description(&self) -> &str {
        "Show parsed arguments"
    }

    async fn execute(
        &self,
        args: &[String],
        ctx: &CommandContext,
        _state: &mut ScopeState,
    ) -> Result<Response, CommandError> {
        let mut embed = Embed::new().title(format!("{}{}", ctx.prefix, ctx.command));
        for (i, arg) in args.iter().enumerate() {
            embed = embed.field(i.to_string(), arg.clone());
        }
        Ok(Response::reply(embed))
    }
}

/// Performs its side effect silently.
pub struct SilentCommand;

#[async_trait]
impl Command for SilentCommand {
    fn name(&self) -> &str {
        "silent"
    }

    fn description(&self) -> &str {
        "Do nothing visible"
    }

    async fn execute(
        &self,
        _args: &[String],
        _ctx: &CommandContext,
        _state: &mut ScopeState,
    ) -> Result<Response, CommandError> {
        Ok(Response::NoAction)
    }
}

/// Panics when run.
pub struct PanicCommand;

#[async_trait]
impl Command for PanicCommand {
    fn name(&self) -> &str {
        "boom"
    }

    fn description(&self) -> &str {
        "Panic"
    }

    async fn execute(
        &self,
        _args: &[String],
        _ctx: &CommandContext,
        _state: &mut ScopeState,
    ) -> Result<Response, CommandError> {
        panic!("command exploded");
    }
}

pub fn test_commands() -> Arc<CommandRegistry> {
    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(PingCommand));
    registry.register(Arc::new(ArgsCommand));
    registry.register(Arc::new(SilentCommand));
    registry.register(Arc::new(PanicCommand));
    Arc::new(registry)
}

pub fn test_config() -> DispatcherConfig {
    DispatcherConfig {
        prefix: "!".into(),
        owner_id: Some("owner".into()),
        send_typing: false,
    }
}

/// Dispatcher over a recording transport with the given query backends.
pub fn test_dispatcher(
    transport: Arc<RecordingTransport>,
    backends: Vec<Arc<dyn QueryBackend>>,
) -> Dispatcher {
    let commands = test_commands();
    let chain = backends
        .into_iter()
        .fold(FallbackChain::new(commands.clone()), |chain, backend| {
            chain.with_backend(backend)
        });
    Dispatcher::new(test_config(), transport, commands, chain)
}

pub fn user(id: &str) -> User {
    User {
        id: id.into(),
        username: format!("user-{}", id),
        discriminator: None,
        bot: false,
    }
}

pub fn message(id: &str, guild: &str, author: &str, content: &str) -> InboundMessage {
    InboundMessage {
        id: id.into(),
        channel_id: format!("{}-general", guild),
        guild_id: Some(guild.into()),
        guild_name: Some(format!("Guild {}", guild)),
        channel_name: Some("general".into()),
        author: user(author),
        content: content.into(),
    }
}
