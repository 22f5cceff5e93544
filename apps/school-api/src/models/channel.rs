use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::channels;
use crate::models::message::ChatMessage;

/// A two-participant conversation.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = channels)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: i64,
    pub first_user_id: i64,
    pub second_user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.first_user_id == user_id || self.second_user_id == user_id
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = channels)]
pub struct NewChannel {
    pub first_user_id: i64,
    pub second_user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A channel together with its history, oldest message first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelWithMessages {
    #[serde(flatten)]
    pub channel: Channel,
    pub messages: Vec<ChatMessage>,
}
