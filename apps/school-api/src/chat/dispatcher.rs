//! Fan-out of encoded chat messages to every connection of a channel.

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes};

use super::registry::{ConnectionHandle, ConnectionRegistry};

/// Broadcasts to the members of a channel. Cloneable; lives in AppState.
#[derive(Clone, Default)]
pub struct ChatDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl ChatDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Deliver `payload` to every connection registered on `channel_id`.
    ///
    /// Each write is a non-blocking enqueue. A connection that is closed or
    /// whose queue is full is closed and unregistered; the rest still get
    /// the message. Returns how many connections accepted it.
    pub fn broadcast(&self, channel_id: i64, payload: Utf8Bytes) -> usize {
        let mut delivered = 0;
        for conn in self.registry.snapshot(channel_id) {
            match conn.try_send(Message::Text(payload.clone())) {
                Ok(()) => delivered += 1,
                Err(reason) => {
                    tracing::warn!(
                        channel_id,
                        connection_id = conn.id(),
                        ?reason,
                        "dropping dead chat connection"
                    );
                    self.prune(channel_id, &conn);
                }
            }
        }
        delivered
    }

    fn prune(&self, channel_id: i64, conn: &ConnectionHandle) {
        conn.close();
        self.registry.unregister(channel_id, conn);
    }
}
