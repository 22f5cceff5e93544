//! Chat socket wire format shared by the server and its clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A frame sent by a client over `/ws/chat/{channelId}`.
///
/// Every frame carries its own credential. A missing or `null` `jwt` still
/// decodes so the server can reject it as an authentication failure;
/// `content` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFrame {
    #[serde(default)]
    pub jwt: Option<String>,
    pub content: String,
}

impl ChatFrame {
    /// The credential as sent, empty when absent.
    pub fn token(&self) -> &str {
        self.jwt.as_deref().unwrap_or_default()
    }
}

/// A persisted message as delivered to every connection of its channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredMessage {
    pub content: String,
    pub channel_id: i64,
    pub sender_id: i64,
    pub created_at: DateTime<Utc>,
}
