//! WebSocket upgrade handler and per-connection chat loop.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::time;

use crate::AppState;

use super::events;
use super::handler::handle_frame;
use super::registry::{ConnectionHandle, ConnectionReceiver};
use super::session::ChatSession;

/// Upper bound on a single socket write before the peer counts as dead.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

pub fn router() -> Router<AppState> {
    Router::new().route("/ws/chat/{channel_id}", get(ws_upgrade))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Path(channel_id): Path<i64>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state, channel_id))
}

async fn handle_connection(socket: WebSocket, state: AppState, channel_id: i64) {
    let (ws_tx, ws_rx) = socket.split();
    let (conn, receiver) = ConnectionHandle::new();
    let connection_id = conn.id();

    let writer = tokio::spawn(write_outbound(ws_tx, receiver, conn.clone()));
    let session = ChatSession::register(state.chat.registry().clone(), channel_id, conn);

    tracing::info!(channel_id, connection_id, "chat client connected");

    run_session(&state, &session, ws_rx).await;

    // Closing: unregister and release the socket.
    drop(session);
    let _ = writer.await;

    tracing::info!(channel_id, connection_id, "chat client disconnected");
}

/// Read frames until the peer goes away or the connection is closed from
/// our side. Rejected frames never end the loop.
async fn run_session(state: &AppState, session: &ChatSession, mut ws_rx: SplitStream<WebSocket>) {
    let mut closed = session.connection().subscribe_closed();

    loop {
        let msg = tokio::select! {
            msg = ws_rx.next() => msg,
            _ = wait_closed(&mut closed) => {
                tracing::debug!(
                    channel_id = session.channel_id,
                    connection_id = session.connection().id(),
                    "chat connection closed by server"
                );
                break;
            }
        };

        match msg {
            Some(Ok(Message::Text(text))) => process_frame(state, session, text.as_str()).await,
            Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                Ok(text) => process_frame(state, session, text).await,
                Err(_) => session.notify(events::FrameError::InvalidPayload),
            },
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(e)) => {
                tracing::debug!(
                    ?e,
                    channel_id = session.channel_id,
                    connection_id = session.connection().id(),
                    "ws read error"
                );
                break;
            }
        }
    }
}

async fn process_frame(state: &AppState, session: &ChatSession, text: &str) {
    let channel_id = session.channel_id;

    match handle_frame(state, channel_id, text).await {
        Ok(message) => {
            let payload = events::encode_delivered(&message.to_delivered());
            let delivered = state.chat.broadcast(channel_id, payload);
            tracing::info!(
                channel_id,
                message_id = message.id,
                sender_id = message.sender_id,
                delivered,
                "chat message sent"
            );
        }
        Err(err) => {
            tracing::debug!(
                ?err,
                channel_id,
                connection_id = session.connection().id(),
                "chat frame rejected"
            );
            session.notify(err);
        }
    }
}

/// Drain the connection's queue into the socket. Exits on close, on a
/// failed write, or when a write exceeds [`WRITE_TIMEOUT`]. Frames queued
/// before the close are still written.
async fn write_outbound<S>(mut ws_tx: S, mut receiver: ConnectionReceiver, conn: ConnectionHandle)
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Debug,
{
    loop {
        tokio::select! {
            biased;

            msg = receiver.outbound.recv() => {
                let Some(msg) = msg else { break };
                match time::timeout(WRITE_TIMEOUT, ws_tx.send(msg)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(?e, connection_id = conn.id(), "ws write error");
                        break;
                    }
                    Err(_) => {
                        tracing::warn!(connection_id = conn.id(), "ws write timed out");
                        break;
                    }
                }
            }
            _ = wait_closed(&mut receiver.closed) => break,
        }
    }

    conn.close();
    let _ = time::timeout(WRITE_TIMEOUT, ws_tx.close()).await;
}

/// Resolves once the close flag is set. Drops the watch guard before
/// returning so callers stay `Send`.
async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    let _ = closed.wait_for(|closed| *closed).await;
}
