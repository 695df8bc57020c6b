//! Application configuration loaded from a TOML file and environment
//! variables.

use crate::intake::DEFAULT_REQUESTS_PER_MINUTE;
use anyhow::{ensure, Context, Result};
use chat_client::Embed;
use config::{Environment, File, FileFormat};
use dispatcher::{CommandInvocation, CommandRegistry, NlpRule, TriggerRule};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Config file read when `GUILD_BOT_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "guild-bot.toml";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Chat platform configuration
    pub discord: DiscordConfig,

    /// Bot configuration
    #[serde(default)]
    pub bot: BotConfig,

    /// Event intake server
    #[serde(default)]
    pub server: ServerConfig,

    /// State persistence
    #[serde(default)]
    pub state: StateConfig,

    /// Optional response strategies
    #[serde(default)]
    pub features: FeaturesConfig,

    /// Custom auto-responses, tried in order
    #[serde(default)]
    pub custom_responses: Vec<CustomResponseConfig>,

    /// Free-text to command routing
    #[serde(default)]
    pub nlp_rules: Vec<NlpRuleConfig>,

    /// Query backends, tried in order
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token
    pub token: String,

    /// REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Global command prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// User who receives moderation errors by direct message and may
    /// change any scope's settings
    #[serde(default)]
    pub owner_id: Option<String>,

    /// Guild roles whose members may change scope settings
    #[serde(default)]
    pub admin_roles: Vec<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Show the typing indicator while working on a reply
    #[serde(default = "default_true")]
    pub send_typing: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token the gateway bridge must send with every event
    #[serde(default)]
    pub intake_secret: Option<SecretString>,

    /// Events accepted per minute across all callers
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// Path of the JSON state file
    #[serde(default = "default_state_path")]
    pub path: String,

    /// Whether to persist state at all
    #[serde(default = "default_true")]
    pub persist: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default)]
    pub use_custom_responses: bool,

    #[serde(default)]
    pub use_nlp: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomResponseConfig {
    /// Regular expression tested against the query text
    pub expression: String,

    #[serde(default)]
    pub case_sensitive: bool,

    /// Static replies, one picked at random
    #[serde(default)]
    pub responses: Vec<Embed>,

    /// Commands, one picked at random; preferred over `responses`
    #[serde(default)]
    pub cmd_responses: Vec<CommandInvocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NlpRuleConfig {
    pub expression: String,
    pub command: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Exchange continuation tokens for multi-turn queries
    #[serde(default)]
    pub continuation: bool,

    /// Request timeout
    #[serde(default = "default_backend_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

// Default implementations
impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            owner_id: None,
            admin_roles: Vec::new(),
            log_level: default_log_level(),
            log_json: false,
            send_typing: default_true(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            intake_secret: None,
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
            persist: default_true(),
        }
    }
}

// Default value functions
fn default_api_url() -> String {
    "https://discord.com/api/v10".into()
}

fn default_prefix() -> String {
    "!".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_requests_per_minute() -> u32 {
    DEFAULT_REQUESTS_PER_MINUTE
}

fn default_state_path() -> String {
    "data/guild-bot.json".into()
}

fn default_backend_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_retries() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from the config file (if present) and environment
    /// variables, then validate it.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let path =
            std::env::var("GUILD_BOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());

        let config: Config = config::Config::builder()
            .add_source(File::new(&path, FileFormat::Toml).required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    // Snowflake IDs must stay strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configuration the bot cannot start with.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.discord.token.trim().is_empty(), "discord.token must be set");
        ensure!(!self.bot.prefix.is_empty(), "bot.prefix must not be empty");
        ensure!(
            self.server
                .intake_secret
                .as_ref()
                .is_some_and(|s| !s.expose_secret().trim().is_empty()),
            "server.intake_secret must be set"
        );
        ensure!(
            self.server.requests_per_minute > 0,
            "server.requests_per_minute must be positive"
        );

        self.trigger_rules()?;
        self.nlp_rules()?;

        let mut names = HashSet::new();
        for backend in &self.backends {
            ensure!(
                !backend.url.trim().is_empty(),
                "backend {:?} has no url",
                backend.name
            );
            ensure!(
                names.insert(backend.name.as_str()),
                "duplicate backend name {:?}",
                backend.name
            );
        }

        Ok(())
    }

    /// Check that every command named by custom responses and NLP rules is
    /// registered.
    pub fn validate_commands(&self, registry: &CommandRegistry) -> Result<()> {
        let configured = self
            .custom_responses
            .iter()
            .flat_map(|rule| rule.cmd_responses.iter().map(|c| c.command_name.as_str()))
            .chain(self.nlp_rules.iter().map(|rule| rule.command.as_str()));

        for name in configured {
            ensure!(
                registry.contains(name),
                "configured command {:?} is not registered",
                name
            );
        }

        Ok(())
    }

    /// Compile custom responses into trigger rules.
    pub fn trigger_rules(&self) -> Result<Vec<TriggerRule>> {
        self.custom_responses
            .iter()
            .map(|rule| {
                Ok(TriggerRule::new(&rule.expression, rule.case_sensitive)
                    .with_context(|| format!("Invalid custom response {:?}", rule.expression))?
                    .with_replies(rule.responses.clone())
                    .with_commands(rule.cmd_responses.clone()))
            })
            .collect()
    }

    /// Compile NLP rules.
    pub fn nlp_rules(&self) -> Result<Vec<NlpRule>> {
        self.nlp_rules
            .iter()
            .map(|rule| {
                NlpRule::new(&rule.expression, &rule.command)
                    .with_context(|| format!("Invalid NLP rule {:?}", rule.expression))
            })
            .collect()
    }

    /// Address the event intake listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = self
            .server
            .listen_addr
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, self.server.port)
    }
}
