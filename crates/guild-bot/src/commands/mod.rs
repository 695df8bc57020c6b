//! Built-in bot commands.

mod admin;
mod forget;
mod help;
mod ping;
mod prefix;
mod swear_filter;

pub use admin::Admins;
pub use forget::ForgetCommand;
pub use help::HelpCommand;
pub use ping::PingCommand;
pub use prefix::PrefixCommand;
pub use swear_filter::SwearFilterCommand;

use dispatcher::CommandRegistry;
use scope_store::SettingsStore;
use std::sync::Arc;

/// Build the registry of built-in commands.
pub fn build_registry(
    settings: SettingsStore,
    global_prefix: &str,
    admins: Admins,
) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(PingCommand));
    registry.register(Arc::new(PrefixCommand::new(
        settings.clone(),
        global_prefix,
        admins.clone(),
    )));
    registry.register(Arc::new(ForgetCommand::new(settings.clone())));
    registry.register(Arc::new(SwearFilterCommand::new(settings.clone(), admins)));

    // Help lists everything registered before it, plus itself.
    let help = HelpCommand::new(registry.describe(), settings, global_prefix);
    registry.register(Arc::new(help));
    registry
}

/// Arguments with the empty tokens left by repeated or trailing spaces
/// removed.
fn arguments(args: &[String]) -> Vec<&str> {
    args.iter()
        .map(String::as_str)
        .filter(|a| !a.is_empty())
        .collect()
}
