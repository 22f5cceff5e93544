use chrono::{DateTime, Utc};
use diesel::prelude::*;
use school_common::DeliveredMessage;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::messages;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = messages)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub content: String,
    pub channel_id: i64,
    pub sender_id: i64,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// The form pushed to every connection of the channel.
    pub fn to_delivered(&self) -> DeliveredMessage {
        DeliveredMessage {
            content: self.content.clone(),
            channel_id: self.channel_id,
            sender_id: self.sender_id,
            created_at: self.created_at,
        }
    }
}

/// A message that passed authorization and is about to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = messages)]
pub struct NewChatMessage {
    pub content: String,
    pub channel_id: i64,
    pub sender_id: i64,
}
