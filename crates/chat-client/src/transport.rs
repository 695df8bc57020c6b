//! Chat transport contract consumed by the dispatcher.

use crate::error::ChatError;
use crate::types::{Embed, Member};
use async_trait::async_trait;

/// Operations the dispatcher needs from a chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// ID of the bot's own account, used for mention matching.
    fn bot_user_id(&self) -> &str;

    /// Send an embed, returning the new message ID.
    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<String, ChatError>;

    /// Send plain text, returning the new message ID.
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<String, ChatError>;

    /// Replace the embed of an existing message.
    async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> Result<(), ChatError>;

    /// Delete a message.
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ChatError>;

    /// Look up a guild member.
    async fn member(&self, guild_id: &str, user_id: &str) -> Result<Member, ChatError>;

    /// Open (or reuse) a direct-message channel with a user.
    async fn direct_channel(&self, user_id: &str) -> Result<String, ChatError>;

    /// Grant a role to a guild member.
    async fn add_role(&self, guild_id: &str, user_id: &str, role_id: &str)
        -> Result<(), ChatError>;

    /// Show the typing indicator in a channel.
    async fn typing(&self, channel_id: &str) -> Result<(), ChatError> {
        let _ = channel_id;
        Ok(())
    }
}
