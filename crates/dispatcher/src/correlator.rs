//! Edit-or-send delivery of replies.

use crate::response::Response;
use chat_client::{ChatError, ChatTransport};
use scope_store::ScopeState;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// What happened when a response was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing visible to deliver; no correlation entry touched.
    Skipped,
    /// A new reply was sent.
    Sent(String),
    /// An earlier reply was edited in place.
    Edited(String),
    /// The transport call failed.
    Failed,
}

/// Delivers responses so that each originating message has at most one
/// reply.
pub struct Correlator {
    transport: Arc<dyn ChatTransport>,
    send_typing: bool,
}

impl Correlator {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            send_typing: false,
        }
    }

    /// Show the typing indicator before sending a new reply.
    pub fn with_typing(mut self, send_typing: bool) -> Self {
        self.send_typing = send_typing;
        self
    }

    /// Deliver a response to the message it answers.
    ///
    /// Edits the recorded reply when there is one, otherwise sends a new
    /// reply and records its ID. A failed send leaves the entry without an
    /// ID so a later edit of the source message sends again. A recorded
    /// reply that no longer exists is replaced by a new one.
    #[instrument(skip(self, response, state))]
    pub async fn deliver(
        &self,
        response: Response,
        channel_id: &str,
        message_id: &str,
        state: &mut ScopeState,
    ) -> Delivery {
        let Some(mut embed) = response.into_embed() else {
            return Delivery::Skipped;
        };
        embed.truncate();

        if let Some(reply_id) = state.reply_for(message_id).map(str::to_string) {
            match self
                .transport
                .edit_embed(channel_id, &reply_id, &embed)
                .await
            {
                Ok(()) => {
                    debug!("Edited reply {}", reply_id);
                    return Delivery::Edited(reply_id);
                }
                Err(ChatError::NotFound(_)) => {
                    debug!("Reply {} is gone, sending a new one", reply_id);
                    state.forget_reply(message_id);
                }
                Err(e) => {
                    warn!("Failed to edit reply {}: {}", reply_id, e);
                    return Delivery::Failed;
                }
            }
        }

        state.track_query(message_id);

        if self.send_typing {
            if let Err(e) = self.transport.typing(channel_id).await {
                debug!("Typing indicator failed: {}", e);
            }
        }

        match self.transport.send_embed(channel_id, &embed).await {
            Ok(reply_id) => {
                debug!("Sent reply {}", reply_id);
                state.record_reply(message_id, &reply_id);
                Delivery::Sent(reply_id)
            }
            Err(e) => {
                warn!("Failed to send reply: {}", e);
                Delivery::Failed
            }
        }
    }
}
