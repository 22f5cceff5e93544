#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::{tungstenite, MaybeTlsStream, WebSocketStream};

use school_api::auth::tokens::{self, TokenUser};
use school_api::config::Config;
use school_api::db::store::MemoryChatStore;
use school_api::models::user::User;
use school_api::AppState;
use school_common::UserKind;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const TEST_SECRET: &str = "test-jwt-secret-do-not-use-in-production";
pub const TEST_SCHOOL_ID: i64 = 1;

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/school_test".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        db_max_connections: 1,
        port: 0,
        base_url: None,
    }
}

/// Build a test AppState backed by the in-memory store.
pub fn test_state() -> (AppState, Arc<MemoryChatStore>) {
    let store = Arc::new(MemoryChatStore::new());
    let state = AppState::new(store.clone(), test_config());
    (state, store)
}

/// Build the full application router wired to a fresh test state.
pub fn test_app() -> (Router, AppState, Arc<MemoryChatStore>) {
    let (state, store) = test_state();
    let app = school_api::routes::router().with_state(state.clone());
    (app, state, store)
}

fn token_user(user_id: i64, kind: UserKind) -> TokenUser {
    TokenUser {
        id: user_id,
        email: format!("user{user_id}@school.test"),
        firstname: format!("First{user_id}"),
        lastname: format!("Last{user_id}"),
        user_kind: kind,
        school_id: Some(TEST_SCHOOL_ID),
    }
}

/// Mint a valid token for `user_id`.
pub fn token_for(user_id: i64, kind: UserKind) -> String {
    tokens::generate(TEST_SECRET, &token_user(user_id, kind)).expect("mint test token")
}

/// Mint a token that expired an hour ago.
pub fn expired_token_for(user_id: i64) -> String {
    let exp = (Utc::now() - chrono::Duration::hours(1)).timestamp();
    tokens::sign(TEST_SECRET, &token_user(user_id, UserKind::Student), exp)
        .expect("mint expired token")
}

/// Mint a token signed with a different secret.
pub fn forged_token_for(user_id: i64) -> String {
    tokens::generate("not-the-server-secret", &token_user(user_id, UserKind::Student))
        .expect("mint forged token")
}

pub fn school_user(id: i64, kind: UserKind) -> User {
    User {
        id,
        email: format!("user{id}@school.test"),
        firstname: format!("First{id}"),
        lastname: format!("Last{id}"),
        user_kind: kind.rank(),
        school_id: Some(TEST_SCHOOL_ID),
    }
}

// ---------------------------------------------------------------------------
// WebSocket helpers
// ---------------------------------------------------------------------------

/// Start an actual TCP server for WebSocket testing.
pub async fn start_ws_server() -> (SocketAddr, AppState, Arc<MemoryChatStore>) {
    let (app, state, store) = test_app();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state, store)
}

/// Connect to a chat channel and wait until the server registered us.
pub async fn connect(addr: SocketAddr, state: &AppState, channel_id: i64) -> WsStream {
    let before = state.chat.registry().snapshot(channel_id).len();
    let url = format!("ws://{addr}/ws/chat/{channel_id}");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    wait_for_members(state, channel_id, before + 1).await;
    ws
}

/// Poll the registry until `channel_id` has exactly `count` members.
pub async fn wait_for_members(state: &AppState, channel_id: i64, count: usize) {
    let deadline = time::Instant::now() + Duration::from_secs(5);
    loop {
        if state.chat.registry().snapshot(channel_id).len() == count {
            return;
        }
        if time::Instant::now() > deadline {
            panic!(
                "channel {channel_id} never reached {count} members (has {})",
                state.chat.registry().snapshot(channel_id).len()
            );
        }
        time::sleep(Duration::from_millis(10)).await;
    }
}

pub async fn send_text(ws: &mut WsStream, text: &str) {
    ws.send(tungstenite::Message::Text(text.to_string().into()))
        .await
        .expect("send frame");
}

pub async fn send_frame(ws: &mut WsStream, jwt: &str, content: &str) {
    let frame = serde_json::json!({ "jwt": jwt, "content": content });
    send_text(ws, &frame.to_string()).await;
}

/// Read the next text frame as JSON, skipping control frames.
pub async fn next_json(ws: &mut WsStream) -> serde_json::Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("stream ended")
            .expect("ws read error");

        match msg {
            tungstenite::Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("frame is JSON")
            }
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Assert that nothing but control frames arrives within `ms`.
pub async fn assert_silent(ws: &mut WsStream, ms: u64) {
    let deadline = time::Instant::now() + Duration::from_millis(ms);
    loop {
        match time::timeout_at(deadline, ws.next()).await {
            Err(_) => return,
            Ok(Some(Ok(tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_)))) => continue,
            Ok(other) => panic!("expected no frame, got {other:?}"),
        }
    }
}

/// Wait until the server ends the connection (close frame or EOF).
pub async fn expect_closed(ws: &mut WsStream) {
    loop {
        match time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for close")
        {
            Some(Ok(tungstenite::Message::Close(_))) | None | Some(Err(_)) => return,
            Some(Ok(_)) => continue,
        }
    }
}
