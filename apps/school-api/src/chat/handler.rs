//! Per-frame processing: decode, authenticate, authorize, persist.

use school_common::{ChatFrame, UserKind};

use crate::auth::tokens;
use crate::models::message::{ChatMessage, NewChatMessage};
use crate::AppState;

use super::events::FrameError;

/// Minimum role allowed to post in a chat channel.
pub const MIN_SENDER_ROLE: UserKind = UserKind::Student;

/// Process one inbound text frame for a connection bound to `channel_id`.
///
/// The token is validated on every frame; nothing about the sender is
/// remembered between frames. Returns the stored message on success.
pub async fn handle_frame(
    state: &AppState,
    channel_id: i64,
    text: &str,
) -> Result<ChatMessage, FrameError> {
    let frame: ChatFrame =
        serde_json::from_str(text).map_err(|_| FrameError::InvalidPayload)?;

    let user = tokens::validate_credential(&state.config.jwt_secret, frame.token(), MIN_SENDER_ROLE)
        .map_err(FrameError::Unauthorized)?;

    let channel = match state.store.get_channel_by_id(channel_id).await {
        Ok(Some(channel)) => channel,
        Ok(None) => {
            tracing::debug!(channel_id, user_id = user.id, "chat channel not found");
            return Err(FrameError::Forbidden);
        }
        Err(err) => {
            tracing::warn!(%err, channel_id, "chat channel lookup failed");
            return Err(FrameError::Forbidden);
        }
    };
    if !channel.has_participant(user.id) {
        tracing::debug!(channel_id, user_id = user.id, "sender is not a channel participant");
        return Err(FrameError::Forbidden);
    }

    state
        .store
        .save_message(NewChatMessage {
            content: frame.content,
            channel_id,
            sender_id: user.id,
        })
        .await
        .map_err(|err| {
            tracing::error!(%err, channel_id, user_id = user.id, "failed to save chat message");
            FrameError::Internal
        })
}
