//! Chat platform types.

use serde::{Deserialize, Serialize};

/// Maximum characters in an embed title.
pub const EMBED_LIMIT_TITLE: usize = 256;
/// Maximum characters in an embed description.
pub const EMBED_LIMIT_DESCRIPTION: usize = 2048;
/// Maximum characters in a field name.
pub const EMBED_LIMIT_FIELD_NAME: usize = 256;
/// Maximum characters in a field value.
pub const EMBED_LIMIT_FIELD_VALUE: usize = 1024;
/// Maximum number of fields in one embed.
pub const EMBED_LIMIT_FIELD: usize = 25;
/// Maximum characters in footer text.
pub const EMBED_LIMIT_FOOTER: usize = 2048;
/// Maximum characters across every text part of an embed.
pub const EMBED_LIMIT: usize = 6000;

/// Colour used for error embeds.
pub const ERROR_COLOR: u32 = 0xB4_00_00;

/// A chat account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

/// A user's membership in a guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Parsed inbound message for bot processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Message ID.
    pub id: String,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Guild ID, absent for direct messages.
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub guild_name: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    pub author: User,
    #[serde(default)]
    pub content: String,
}

impl InboundMessage {
    /// Get the scope this message belongs to (guild ID or, for direct
    /// messages, the channel ID).
    pub fn scope_id(&self) -> &str {
        self.guild_id.as_deref().unwrap_or(&self.channel_id)
    }
}

/// Rich message payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a red error embed.
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new()
            .title(title)
            .description(description)
            .color(ERROR_COLOR)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    /// Mark every field as inline.
    pub fn inline_all(mut self) -> Self {
        for field in &mut self.fields {
            field.inline = true;
        }
        self
    }

    /// Whether the embed carries any visible text.
    pub fn is_empty(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().map_or(true, |s| s.trim().is_empty());
        blank(&self.title) && blank(&self.description) && self.fields.is_empty()
    }

    /// Total characters counted against [`EMBED_LIMIT`].
    pub fn text_len(&self) -> usize {
        let len = |s: &Option<String>| s.as_deref().map_or(0, |s| s.chars().count());
        len(&self.title)
            + len(&self.description)
            + self
                .fields
                .iter()
                .map(|f| f.name.chars().count() + f.value.chars().count())
                .sum::<usize>()
            + self.footer.as_ref().map_or(0, |f| f.text.chars().count())
    }

    /// Enforce platform length limits in place.
    ///
    /// Per-part limits are applied first. If the embed still exceeds
    /// [`EMBED_LIMIT`], trailing fields are dropped and then the
    /// description is shortened.
    pub fn truncate(&mut self) {
        if let Some(title) = self.title.as_mut() {
            truncate_chars(title, EMBED_LIMIT_TITLE);
        }
        if let Some(description) = self.description.as_mut() {
            truncate_chars(description, EMBED_LIMIT_DESCRIPTION);
        }
        self.fields.truncate(EMBED_LIMIT_FIELD);
        for field in &mut self.fields {
            truncate_chars(&mut field.name, EMBED_LIMIT_FIELD_NAME);
            truncate_chars(&mut field.value, EMBED_LIMIT_FIELD_VALUE);
        }
        if let Some(footer) = self.footer.as_mut() {
            truncate_chars(&mut footer.text, EMBED_LIMIT_FOOTER);
        }

        while self.text_len() > EMBED_LIMIT && !self.fields.is_empty() {
            self.fields.pop();
        }

        let excess = self.text_len().saturating_sub(EMBED_LIMIT);
        if excess > 0 {
            if let Some(description) = self.description.as_mut() {
                let keep = description.chars().count().saturating_sub(excess);
                truncate_chars(description, keep);
            }
        }
    }
}

/// Truncate a string to at most `max` characters on a char boundary.
fn truncate_chars(s: &mut String, max: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
}

/// Outgoing message request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

/// Message returned by the platform after a send or edit.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub channel_id: String,
}

/// Request to open a direct-message channel.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDmRequest {
    pub recipient_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}
