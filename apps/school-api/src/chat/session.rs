//! Registry membership of one chat connection.

use std::sync::Arc;

use axum::extract::ws::Message;

use super::events::FrameError;
use super::registry::{ConnectionHandle, ConnectionRegistry};

/// A connection registered on its channel for as long as this value lives.
///
/// Dropping the session is the single teardown path: it unregisters the
/// connection and signals its writer to close, whichever way the loop ended.
pub struct ChatSession {
    /// Channel the connection was opened for. Fixed for its lifetime.
    pub channel_id: i64,
    conn: ConnectionHandle,
    registry: Arc<ConnectionRegistry>,
}

impl ChatSession {
    pub fn register(
        registry: Arc<ConnectionRegistry>,
        channel_id: i64,
        conn: ConnectionHandle,
    ) -> Self {
        registry.register(channel_id, conn.clone());
        Self {
            channel_id,
            conn,
            registry,
        }
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.conn
    }

    /// Tell this client (and only this client) that its frame was rejected.
    pub fn notify(&self, err: FrameError) {
        let notice = Message::Text(err.notification().encode());
        if let Err(reason) = self.conn.try_send(notice) {
            tracing::debug!(
                channel_id = self.channel_id,
                connection_id = self.conn.id(),
                ?reason,
                "could not queue notification"
            );
            self.conn.close();
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.registry.unregister(self.channel_id, &self.conn);
        self.conn.close();
    }
}
