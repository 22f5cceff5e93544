//! Per-channel registry of live chat connections.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{mpsc, watch};

/// Outbound frames a connection may have queued before it counts as stalled.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

pub type ConnectionId = u64;

/// Why a frame could not be queued on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The writer is gone or the connection was closed.
    Closed,
    /// The peer is not draining its queue.
    Stalled,
}

/// Cloneable handle to one live connection.
///
/// Writes never touch the socket directly: they are queued for the
/// connection's writer task, so pushing to a handle never waits on the
/// network.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<Message>,
    closed: Arc<watch::Sender<bool>>,
}

/// The receiving half of a connection, owned by its writer.
pub struct ConnectionReceiver {
    pub outbound: mpsc::Receiver<Message>,
    pub closed: watch::Receiver<bool>,
}

impl ConnectionHandle {
    /// Create a connection handle and the queue its writer drains.
    pub fn new() -> (Self, ConnectionReceiver) {
        Self::with_capacity(OUTBOUND_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, ConnectionReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        let (closed_tx, closed_rx) = watch::channel(false);
        let handle = Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            outbound: tx,
            closed: Arc::new(closed_tx),
        };
        let receiver = ConnectionReceiver {
            outbound: rx,
            closed: closed_rx,
        };
        (handle, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a frame without waiting.
    pub fn try_send(&self, msg: Message) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }
        self.outbound.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Stalled,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Signal the connection's tasks to shut down. Idempotent.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow() || self.outbound.is_closed()
    }

    /// A receiver that observes [`ConnectionHandle::close`].
    pub fn subscribe_closed(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Shared registry of live connections, keyed by chat channel id.
///
/// Every operation runs under the `DashMap` shard lock of its channel, so a
/// register, unregister or snapshot on one channel never interleaves with
/// another on the same channel, and channels hashed to different shards
/// never contend. Nothing here performs I/O.
#[derive(Default)]
pub struct ConnectionRegistry {
    channels: DashMap<i64, HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `conn` to the members of `channel_id`, creating the entry when
    /// absent. Registering the same connection twice keeps one entry.
    pub fn register(&self, channel_id: i64, conn: ConnectionHandle) {
        self.channels
            .entry(channel_id)
            .or_default()
            .insert(conn.id(), conn);
    }

    /// Remove `conn` from `channel_id`. The channel entry is dropped with its
    /// last member. Unknown connections are ignored.
    pub fn unregister(&self, channel_id: i64, conn: &ConnectionHandle) {
        if let Entry::Occupied(mut entry) = self.channels.entry(channel_id) {
            entry.get_mut().remove(&conn.id());
            if entry.get().is_empty() {
                entry.remove();
            }
        }
    }

    /// Copy of the current members of `channel_id`.
    pub fn snapshot(&self, channel_id: i64) -> Vec<ConnectionHandle> {
        self.channels
            .get(&channel_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, channel_id: i64, conn: &ConnectionHandle) -> bool {
        self.channels
            .get(&channel_id)
            .is_some_and(|members| members.contains_key(&conn.id()))
    }

    /// Number of channels with at least one live connection.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Close every registered connection. Sessions unregister themselves as
    /// they wind down.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        for members in self.channels.iter() {
            for conn in members.values() {
                conn.close();
                closed += 1;
            }
        }
        closed
    }
}
