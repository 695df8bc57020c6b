//! Discord REST client.

use crate::error::ChatError;
use crate::transport::ChatTransport;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Discord REST API client.
///
/// The bot token is stored using `SecretString` so it never shows up in
/// debug output.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    base_url: String,
    token: SecretString,
    bot_user_id: String,
}

impl DiscordClient {
    /// Create a new Discord client.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: SecretString::new(token.into()),
            bot_user_id: String::new(),
        })
    }

    /// Set the bot account ID used for mention matching.
    pub fn with_bot_user(mut self, user_id: impl Into<String>) -> Self {
        self.bot_user_id = user_id.into();
        self
    }

    /// Fetch the account the token belongs to.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, ChatError> {
        let response = self
            .authorized(self.client.get(format!("{}/users/@me", self.base_url)))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Check if the API is reachable with the configured token.
    pub async fn health_check(&self) -> bool {
        self.current_user().await.is_ok()
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            "Authorization",
            format!("Bot {}", self.token.expose_secret()),
        )
    }

    async fn create_message(
        &self,
        channel_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<String, ChatError> {
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/channels/{}/messages", self.base_url, channel_id)),
            )
            .json(request)
            .send()
            .await?;

        let message: MessageResponse = self.handle_response(response).await?;
        debug!("Sent message {} to channel {}", message.id, channel_id);
        Ok(message.id)
    }

    /// Handle a response with a JSON body.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ChatError> {
        if response.status().is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(ChatError::from)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Handle a response whose body is ignored.
    async fn handle_empty(&self, response: reqwest::Response) -> Result<(), ChatError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.extract_error(response).await)
        }
    }

    async fn extract_error(&self, response: reqwest::Response) -> ChatError {
        let status = response.status();
        let url = response.url().path().to_string();

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Rate limit exceeded on {}", url);
                ChatError::RateLimit
            }
            StatusCode::UNAUTHORIZED => {
                warn!("Authentication failed");
                ChatError::Unauthorized
            }
            StatusCode::NOT_FOUND => ChatError::NotFound(url),
            _ => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".into());
                ChatError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

#[async_trait]
impl ChatTransport for DiscordClient {
    fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    #[instrument(skip(self, embed))]
    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<String, ChatError> {
        let request = CreateMessageRequest {
            content: None,
            embeds: vec![embed.clone()],
        };
        self.create_message(channel_id, &request).await
    }

    #[instrument(skip(self, text))]
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<String, ChatError> {
        let request = CreateMessageRequest {
            content: Some(text.to_string()),
            embeds: Vec::new(),
        };
        self.create_message(channel_id, &request).await
    }

    #[instrument(skip(self, embed))]
    async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> Result<(), ChatError> {
        let request = CreateMessageRequest {
            content: None,
            embeds: vec![embed.clone()],
        };

        let response = self
            .authorized(self.client.patch(format!(
                "{}/channels/{}/messages/{}",
                self.base_url, channel_id, message_id
            )))
            .json(&request)
            .send()
            .await?;

        let _: MessageResponse = self.handle_response(response).await?;
        debug!("Edited message {} in channel {}", message_id, channel_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ChatError> {
        let response = self
            .authorized(self.client.delete(format!(
                "{}/channels/{}/messages/{}",
                self.base_url, channel_id, message_id
            )))
            .send()
            .await?;

        self.handle_empty(response).await
    }

    #[instrument(skip(self))]
    async fn member(&self, guild_id: &str, user_id: &str) -> Result<Member, ChatError> {
        let response = self
            .authorized(self.client.get(format!(
                "{}/guilds/{}/members/{}",
                self.base_url, guild_id, user_id
            )))
            .send()
            .await?;

        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    async fn direct_channel(&self, user_id: &str) -> Result<String, ChatError> {
        let request = CreateDmRequest {
            recipient_id: user_id.to_string(),
        };

        let response = self
            .authorized(self.client.post(format!("{}/users/@me/channels", self.base_url)))
            .json(&request)
            .send()
            .await?;

        let channel: Channel = self.handle_response(response).await?;
        Ok(channel.id)
    }

    #[instrument(skip(self))]
    async fn add_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), ChatError> {
        let response = self
            .authorized(self.client.put(format!(
                "{}/guilds/{}/members/{}/roles/{}",
                self.base_url, guild_id, user_id, role_id
            )))
            .send()
            .await?;

        self.handle_empty(response).await
    }

    async fn typing(&self, channel_id: &str) -> Result<(), ChatError> {
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/channels/{}/typing", self.base_url, channel_id)),
            )
            .send()
            .await?;

        self.handle_empty(response).await
    }
}
