//! Trigger rules and message classification helpers.

use crate::error::DispatchError;
use chat_client::Embed;
use regex::{Regex, RegexBuilder};
use scope_store::RoleMe;
use serde::{Deserialize, Serialize};

/// A command to run when a trigger rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInvocation {
    pub command_name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A custom auto-response: an expression plus replies or commands.
///
/// The expression is compiled when the rule is built, so a rule set that
/// exists has no invalid patterns.
#[derive(Debug, Clone)]
pub struct TriggerRule {
    regex: Regex,
    replies: Vec<Embed>,
    commands: Vec<CommandInvocation>,
}

impl TriggerRule {
    pub fn new(expression: &str, case_sensitive: bool) -> Result<Self, DispatchError> {
        Ok(Self {
            regex: compile(expression, case_sensitive)?,
            replies: Vec::new(),
            commands: Vec::new(),
        })
    }

    pub fn with_replies(mut self, replies: Vec<Embed>) -> Self {
        self.replies = replies;
        self
    }

    pub fn with_commands(mut self, commands: Vec<CommandInvocation>) -> Self {
        self.commands = commands;
        self
    }

    pub fn expression(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn replies(&self) -> &[Embed] {
        &self.replies
    }

    pub fn commands(&self) -> &[CommandInvocation] {
        &self.commands
    }
}

/// Maps free text matching an expression onto a command.
#[derive(Debug, Clone)]
pub struct NlpRule {
    regex: Regex,
    command: String,
}

impl NlpRule {
    /// Build a rule. NLP expressions always match case-insensitively.
    pub fn new(expression: &str, command: impl Into<String>) -> Result<Self, DispatchError> {
        Ok(Self {
            regex: compile(expression, false)?,
            command: command.into(),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Capture groups of the first match, in order, as command arguments.
    ///
    /// Groups that did not take part in the match are skipped.
    pub fn arguments(&self, text: &str) -> Option<Vec<String>> {
        let captures = self.regex.captures(text)?;
        Some(
            captures
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_string())
                .collect(),
        )
    }
}

fn compile(expression: &str, case_sensitive: bool) -> Result<Regex, DispatchError> {
    RegexBuilder::new(expression)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| DispatchError::InvalidPattern {
            pattern: expression.to_string(),
            reason: e.to_string(),
        })
}

/// Role rules whose triggers equal the whole message.
pub fn matched_role_rules<'a>(
    rules: &'a [RoleMe],
    content: &'a str,
) -> impl Iterator<Item = &'a RoleMe> + 'a {
    rules.iter().filter(move |rule| rule.matches(content))
}

/// Strip `prefix` from the start of `content`.
pub fn match_prefix<'a>(content: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    content.strip_prefix(prefix)
}

/// Extract the query from a message that starts by mentioning the bot.
///
/// Every mention of the bot is removed, then any leading spaces, commas and
/// colons.
pub fn strip_mention(content: &str, bot_id: &str) -> Option<String> {
    let plain = format!("<@{}>", bot_id);
    let nick = format!("<@!{}>", bot_id);

    if !content.starts_with(&plain) && !content.starts_with(&nick) {
        return None;
    }

    let query = content.replace(&nick, "").replace(&plain, "");
    Some(query.trim_start_matches(&[' ', ',', ':'][..]).to_string())
}
