use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use school_common::UserKind;

use crate::error::ApiError;
use crate::models::channel::Channel;
use crate::models::message::{ChatMessage, NewChatMessage};
use crate::models::user::User;

/// Persistence used by the chat gateway and the chat routes.
///
/// Backed by PostgreSQL in production and an in-memory store in tests.
/// Implementations must be safe to call from many sessions at once.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn get_channel_by_id(&self, channel_id: i64) -> Result<Option<Channel>, ApiError>;
    async fn save_message(&self, message: NewChatMessage) -> Result<ChatMessage, ApiError>;
    async fn create_channel(&self, first_user_id: i64, second_user_id: i64)
        -> Result<Channel, ApiError>;
    async fn list_channels_for_user(&self, user_id: i64) -> Result<Vec<Channel>, ApiError>;
    /// Messages of a channel, oldest first.
    async fn list_messages(&self, channel_id: i64) -> Result<Vec<ChatMessage>, ApiError>;
    async fn list_school_users(&self, school_id: i64, kind: UserKind)
        -> Result<Vec<User>, ApiError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation (for local runs / tests)
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    channels: Vec<Channel>,
    messages: Vec<ChatMessage>,
    next_channel_id: i64,
    next_message_id: i64,
    fail_saves: bool,
}

#[derive(Default)]
pub struct MemoryChatStore {
    state: Mutex<MemoryState>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.state.lock().users.push(user);
    }

    /// Seed a channel with a fixed id.
    pub fn insert_channel(&self, id: i64, first_user_id: i64, second_user_id: i64) -> Channel {
        let now = Utc::now();
        let channel = Channel {
            id,
            first_user_id,
            second_user_id,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.lock();
        state.next_channel_id = state.next_channel_id.max(id);
        state.channels.push(channel.clone());
        channel
    }

    /// Make every following `save_message` call fail.
    pub fn fail_saves(&self, fail: bool) {
        self.state.lock().fail_saves = fail;
    }

    pub fn saved_messages(&self) -> Vec<ChatMessage> {
        self.state.lock().messages.clone()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn get_channel_by_id(&self, channel_id: i64) -> Result<Option<Channel>, ApiError> {
        Ok(self
            .state
            .lock()
            .channels
            .iter()
            .find(|c| c.id == channel_id)
            .cloned())
    }

    async fn save_message(&self, message: NewChatMessage) -> Result<ChatMessage, ApiError> {
        let mut state = self.state.lock();
        if state.fail_saves {
            return Err(ApiError::internal("message store unavailable"));
        }
        state.next_message_id += 1;
        let saved = ChatMessage {
            id: state.next_message_id,
            content: message.content,
            channel_id: message.channel_id,
            sender_id: message.sender_id,
            created_at: Utc::now(),
        };
        state.messages.push(saved.clone());
        Ok(saved)
    }

    async fn create_channel(
        &self,
        first_user_id: i64,
        second_user_id: i64,
    ) -> Result<Channel, ApiError> {
        let mut state = self.state.lock();
        let exists = state
            .channels
            .iter()
            .any(|c| c.has_participant(first_user_id) && c.has_participant(second_user_id));
        if exists {
            return Err(ApiError::conflict("Channel already exists"));
        }
        state.next_channel_id += 1;
        let now = Utc::now();
        let channel = Channel {
            id: state.next_channel_id,
            first_user_id,
            second_user_id,
            created_at: now,
            updated_at: now,
        };
        state.channels.push(channel.clone());
        Ok(channel)
    }

    async fn list_channels_for_user(&self, user_id: i64) -> Result<Vec<Channel>, ApiError> {
        Ok(self
            .state
            .lock()
            .channels
            .iter()
            .filter(|c| c.has_participant(user_id))
            .cloned()
            .collect())
    }

    async fn list_messages(&self, channel_id: i64) -> Result<Vec<ChatMessage>, ApiError> {
        Ok(self
            .state
            .lock()
            .messages
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect())
    }

    async fn list_school_users(
        &self,
        school_id: i64,
        kind: UserKind,
    ) -> Result<Vec<User>, ApiError> {
        Ok(self
            .state
            .lock()
            .users
            .iter()
            .filter(|u| u.school_id == Some(school_id) && u.kind() == Some(kind))
            .cloned()
            .collect())
    }
}
