//! Guild bot - main entry point.

use anyhow::Context;
use chat_client::{ChatTransport, DiscordClient};
use dispatcher::{Dispatcher, DispatcherConfig, FallbackChain};
use guild_bot::commands::{build_registry, Admins};
use guild_bot::config::{BackendConfig, BotConfig, Config};
use guild_bot::error::AppResult;
use guild_bot::intake::{create_router_with_rate_limit, AppState, IntakeAuth, RateLimitState};
use query_backends::HttpQueryBackend;
use scope_store::{PersistedState, ScopeRegistry, SettingsStore, StateFile};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot);

    info!("Starting guild bot...");

    // Chat client
    let client = DiscordClient::new(&config.discord.api_url, &config.discord.token)
        .context("Failed to create chat client")?;
    let me = client
        .current_user()
        .await
        .context("Failed to reach the chat API")?;
    info!("Logged in as {} ({})", me.username, me.id);
    let transport: Arc<dyn ChatTransport> = Arc::new(client.with_bot_user(me.id));

    // Restore state
    let (state_file, persisted) = if config.state.persist {
        StateFile::open(&config.state.path).await?
    } else {
        info!("Persistence disabled, using in-memory state");
        (StateFile::memory(), PersistedState::default())
    };
    let scopes = ScopeRegistry::from_snapshots(persisted.scopes);
    let settings = SettingsStore::from_persisted(persisted.scope_settings, persisted.user_settings);

    // Commands and response strategies
    let admins = Admins::new(config.bot.owner_id.clone(), config.bot.admin_roles.clone());
    let commands = Arc::new(build_registry(settings.clone(), &config.bot.prefix, admins));
    config.validate_commands(&commands)?;
    info!("Registered {} commands", commands.len());

    let mut chain = FallbackChain::new(commands.clone());
    if config.features.use_custom_responses {
        let rules = config.trigger_rules()?;
        info!("Loaded {} custom responses", rules.len());
        chain = chain.with_custom_responses(rules);
    }
    if config.features.use_nlp {
        let rules = config.nlp_rules()?;
        info!("Loaded {} NLP rules", rules.len());
        chain = chain.with_nlp_rules(rules);
    }
    for backend in &config.backends {
        chain = chain.with_backend(Arc::new(build_backend(backend)?));
        info!("Query backend {} at {}", backend.name, backend.url);
    }
    if !chain.is_enabled() {
        warn!("No custom responses, NLP rules or query backends enabled; mentions will be ignored");
    }

    let dispatcher = Dispatcher::new(
        DispatcherConfig {
            prefix: config.bot.prefix.clone(),
            owner_id: config.bot.owner_id.clone(),
            send_typing: config.bot.send_typing,
        },
        transport,
        commands,
        chain,
    )
    .with_scopes(scopes)
    .with_settings(settings)
    .with_state_file(Arc::new(state_file));

    // Event intake
    let auth = config
        .server
        .intake_secret
        .clone()
        .map(IntakeAuth::new)
        .context("server.intake_secret must be set")?;
    let app = create_router_with_rate_limit(
        AppState::new(Arc::new(dispatcher), auth),
        RateLimitState::new(config.server.requests_per_minute),
    );
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("Listening for events on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    Ok(())
}

fn build_backend(config: &BackendConfig) -> AppResult<HttpQueryBackend> {
    let mut backend = HttpQueryBackend::new(&config.name, &config.url, config.timeout)?
        .with_continuation(config.continuation)
        .with_max_retries(config.max_retries);
    if let Some(api_key) = &config.api_key {
        backend = backend.with_api_key(api_key);
    }
    Ok(backend)
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_logging(bot: &BotConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&bot.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(bot.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!bot.log_json).then(tracing_subscriber::fmt::layer))
        .init();
}
