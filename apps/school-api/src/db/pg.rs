//! PostgreSQL-backed [`ChatStore`].

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel_async::RunQueryDsl;
use school_common::UserKind;

use crate::db::pool::DbPool;
use crate::db::schema::{channels, messages, users};
use crate::db::store::ChatStore;
use crate::error::ApiError;
use crate::models::channel::{Channel, NewChannel};
use crate::models::message::{ChatMessage, NewChatMessage};
use crate::models::user::User;

#[derive(Clone)]
pub struct PgChatStore {
    db: DbPool,
}

impl PgChatStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn get_channel_by_id(&self, channel_id: i64) -> Result<Option<Channel>, ApiError> {
        let mut conn = self.db.get().await?;
        let channel = channels::table
            .find(channel_id)
            .select(Channel::as_select())
            .get_result(&mut conn)
            .await
            .optional()?;
        Ok(channel)
    }

    async fn save_message(&self, message: NewChatMessage) -> Result<ChatMessage, ApiError> {
        let mut conn = self.db.get().await?;
        let saved = diesel::insert_into(messages::table)
            .values(&message)
            .returning(ChatMessage::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(saved)
    }

    async fn create_channel(
        &self,
        first_user_id: i64,
        second_user_id: i64,
    ) -> Result<Channel, ApiError> {
        let mut conn = self.db.get().await?;

        let existing: Option<i64> = channels::table
            .filter(
                channels::first_user_id
                    .eq(first_user_id)
                    .and(channels::second_user_id.eq(second_user_id))
                    .or(channels::first_user_id
                        .eq(second_user_id)
                        .and(channels::second_user_id.eq(first_user_id))),
            )
            .select(channels::id)
            .first(&mut conn)
            .await
            .optional()?;
        if existing.is_some() {
            return Err(ApiError::conflict("Channel already exists"));
        }

        let now = Utc::now();
        let channel = diesel::insert_into(channels::table)
            .values(NewChannel {
                first_user_id,
                second_user_id,
                created_at: now,
                updated_at: now,
            })
            .returning(Channel::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(channel)
    }

    async fn list_channels_for_user(&self, user_id: i64) -> Result<Vec<Channel>, ApiError> {
        let mut conn = self.db.get().await?;
        let list = channels::table
            .filter(
                channels::first_user_id
                    .eq(user_id)
                    .or(channels::second_user_id.eq(user_id)),
            )
            .order(channels::updated_at.desc())
            .select(Channel::as_select())
            .load(&mut conn)
            .await?;
        Ok(list)
    }

    async fn list_messages(&self, channel_id: i64) -> Result<Vec<ChatMessage>, ApiError> {
        let mut conn = self.db.get().await?;
        let list = messages::table
            .filter(messages::channel_id.eq(channel_id))
            .order(messages::id.asc())
            .select(ChatMessage::as_select())
            .load(&mut conn)
            .await?;
        Ok(list)
    }

    async fn list_school_users(
        &self,
        school_id: i64,
        kind: UserKind,
    ) -> Result<Vec<User>, ApiError> {
        let mut conn = self.db.get().await?;
        let list = users::table
            .filter(users::school_id.eq(school_id))
            .filter(users::user_kind.eq(kind.rank()))
            .order(users::lastname.asc())
            .select(User::as_select())
            .load(&mut conn)
            .await?;
        Ok(list)
    }
}
