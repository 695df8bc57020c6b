//! Chat platform client and transport contract.

mod client;
mod error;
mod transport;
mod types;

pub use client::DiscordClient;
pub use error::ChatError;
pub use transport::ChatTransport;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(mock_server: &MockServer) -> DiscordClient {
        DiscordClient::new(mock_server.uri(), "test-token")
            .unwrap()
            .with_bot_user("1000")
    }

    #[tokio::test]
    async fn test_current_user() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/@me"))
            .and(header("Authorization", "Bot test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "1000",
                "username": "guildbot",
                "bot": true
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let user = client.current_user().await.unwrap();

        assert_eq!(user.id, "1000");
        assert!(user.bot);
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_unauthorized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/@me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(!client.health_check().await);
        assert!(matches!(
            client.current_user().await,
            Err(ChatError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_send_embed_returns_message_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/channels/42/messages"))
            .and(body_json(serde_json::json!({
                "embeds": [{"title": "Hello", "description": "World"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "555",
                "channel_id": "42"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let embed = Embed::new().title("Hello").description("World");
        let id = client.send_embed("42", &embed).await.unwrap();

        assert_eq!(id, "555");
    }

    #[tokio::test]
    async fn test_send_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/channels/42/messages"))
            .and(body_json(serde_json::json!({"content": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "556",
                "channel_id": "42"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert_eq!(client.send_text("42", "hi").await.unwrap(), "556");
    }

    #[tokio::test]
    async fn test_edit_embed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/channels/42/messages/555"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "555",
                "channel_id": "42"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let embed = Embed::new().description("updated");
        assert!(client.edit_embed("42", "555", &embed).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_message_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/channels/42/messages/1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.delete_message("42", "1").await;

        assert!(matches!(result, Err(ChatError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_send_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/channels/42/messages"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.send_text("42", "hi").await;

        assert!(matches!(result, Err(ChatError::RateLimit)));
    }

    #[tokio::test]
    async fn test_direct_channel_and_member() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/@me/channels"))
            .and(body_json(serde_json::json!({"recipient_id": "7"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "900"
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/guilds/1/members/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user": {"id": "7", "username": "alice"},
                "nick": "Al",
                "roles": ["r1"]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/guilds/1/members/7/roles/r2"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert_eq!(client.direct_channel("7").await.unwrap(), "900");

        let member = client.member("1", "7").await.unwrap();
        assert_eq!(member.nick.as_deref(), Some("Al"));
        assert_eq!(member.roles, vec!["r1".to_string()]);

        assert!(client.add_role("1", "7", "r2").await.is_ok());
    }

    #[test]
    fn test_scope_id_falls_back_to_channel() {
        let mut message = InboundMessage {
            id: "1".into(),
            channel_id: "c1".into(),
            guild_id: None,
            guild_name: None,
            channel_name: None,
            author: User {
                id: "u1".into(),
                username: "alice".into(),
                discriminator: None,
                bot: false,
            },
            content: "hi".into(),
        };
        assert_eq!(message.scope_id(), "c1");

        message.guild_id = Some("g1".into());
        assert_eq!(message.scope_id(), "g1");
    }

    #[test]
    fn test_truncate_per_part_limits() {
        let mut embed = Embed::new()
            .title("t".repeat(300))
            .description("d".repeat(3000))
            .footer("f".repeat(10));
        for i in 0..30 {
            embed = embed.field(format!("name{}", i), "v");
        }

        embed.truncate();

        assert_eq!(embed.title.as_ref().unwrap().chars().count(), EMBED_LIMIT_TITLE);
        assert_eq!(
            embed.description.as_ref().unwrap().chars().count(),
            EMBED_LIMIT_DESCRIPTION
        );
        assert_eq!(embed.fields.len(), EMBED_LIMIT_FIELD);
    }

    #[test]
    fn test_truncate_total_limit_drops_trailing_fields() {
        let mut embed = Embed::new().description("d".repeat(2000));
        for i in 0..10 {
            embed = embed.field(format!("f{}", i), "v".repeat(1000));
        }

        embed.truncate();

        assert!(embed.text_len() <= EMBED_LIMIT);
        assert!(embed.fields.len() < 10);
        assert_eq!(embed.fields[0].name, "f0");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let mut embed = Embed::new().title("é".repeat(300));
        embed.truncate();
        assert_eq!(embed.title.unwrap().chars().count(), EMBED_LIMIT_TITLE);
    }

    #[test]
    fn test_embed_is_empty() {
        assert!(Embed::new().is_empty());
        assert!(Embed::new().title("  ").is_empty());
        assert!(!Embed::new().description("x").is_empty());
        assert!(!Embed::new().field("a", "b").is_empty());
    }
}
