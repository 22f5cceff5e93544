mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;
use school_api::db::store::ChatStore;
use school_api::models::message::NewChatMessage;
use school_common::UserKind;

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

// ---------------------------------------------------------------------------
// POST /api/v1/chats/channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_channel_returns_created_channel() {
    let (app, _state, store) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let token = common::token_for(10, UserKind::Student);

    let resp = server
        .post("/api/v1/chats/channel")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&serde_json::json!({ "firstUserId": 10, "secondUserId": 20 }))
        .await;

    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["firstUserId"], 10);
    assert_eq!(body["secondUserId"], 20);
    assert!(body["createdAt"].is_string());
    assert_eq!(store.list_channels_for_user(20).await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_channel_requires_auth() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/v1/chats/channel")
        .json(&serde_json::json!({ "firstUserId": 10, "secondUserId": 20 }))
        .await;

    resp.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json::<serde_json::Value>()["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn create_channel_rejects_expired_token() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/v1/chats/channel")
        .add_header(AUTHORIZATION, bearer(&common::expired_token_for(10)))
        .json(&serde_json::json!({ "firstUserId": 10, "secondUserId": 20 }))
        .await;

    resp.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_channel_for_other_users_is_forbidden() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let token = common::token_for(99, UserKind::Student);

    let resp = server
        .post("/api/v1/chats/channel")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&serde_json::json!({ "firstUserId": 10, "secondUserId": 20 }))
        .await;

    resp.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_channel_validates_body() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let token = common::token_for(10, UserKind::Student);

    let resp = server
        .post("/api/v1/chats/channel")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&serde_json::json!({ "firstUserId": 10 }))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"][0]["field"], "secondUserId");

    let resp = server
        .post("/api/v1/chats/channel")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&serde_json::json!({ "firstUserId": 10, "secondUserId": 10 }))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_duplicate_channel_conflicts() {
    let (app, _state, store) = common::test_app();
    let server = TestServer::new(app).unwrap();
    store.insert_channel(7, 10, 20);
    let token = common::token_for(20, UserKind::Student);

    let resp = server
        .post("/api/v1/chats/channel")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&serde_json::json!({ "firstUserId": 20, "secondUserId": 10 }))
        .await;

    resp.assert_status(StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// GET /api/v1/chats/channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_channels_returns_only_callers_channels() {
    let (app, _state, store) = common::test_app();
    let server = TestServer::new(app).unwrap();
    store.insert_channel(1, 10, 20);
    store.insert_channel(2, 30, 10);
    store.insert_channel(3, 20, 30);

    let resp = server
        .get("/api/v1/chats/channel")
        .add_header(AUTHORIZATION, bearer(&common::token_for(10, UserKind::Student)))
        .await;

    resp.assert_status_ok();
    let body: Vec<serde_json::Value> = resp.json();
    let mut ids: Vec<i64> = body.iter().map(|c| c["id"].as_i64().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
}

// ---------------------------------------------------------------------------
// GET /api/v1/chats/channel/{id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_channel_includes_history() {
    let (app, _state, store) = common::test_app();
    let server = TestServer::new(app).unwrap();
    store.insert_channel(7, 10, 20);
    for content in ["first", "second"] {
        store
            .save_message(NewChatMessage {
                content: content.to_string(),
                channel_id: 7,
                sender_id: 10,
            })
            .await
            .unwrap();
    }

    let resp = server
        .get("/api/v1/chats/channel/7")
        .add_header(AUTHORIZATION, bearer(&common::token_for(20, UserKind::Student)))
        .await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["id"], 7);
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["messages"][0]["content"], "first");
    assert_eq!(body["messages"][1]["content"], "second");
    assert_eq!(body["messages"][1]["senderId"], 10);
}

#[tokio::test]
async fn get_channel_not_found() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .get("/api/v1/chats/channel/404")
        .add_header(AUTHORIZATION, bearer(&common::token_for(10, UserKind::Student)))
        .await;

    resp.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_channel_of_others_is_forbidden() {
    let (app, _state, store) = common::test_app();
    let server = TestServer::new(app).unwrap();
    store.insert_channel(7, 10, 20);

    let resp = server
        .get("/api/v1/chats/channel/7")
        .add_header(AUTHORIZATION, bearer(&common::token_for(99, UserKind::Student)))
        .await;

    resp.assert_status(StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// GET /api/v1/chats/students, /api/v1/chats/teachers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn student_chatters_exclude_existing_channels() {
    let (app, _state, store) = common::test_app();
    let server = TestServer::new(app).unwrap();
    store.insert_user(common::school_user(1, UserKind::Teacher));
    store.insert_user(common::school_user(10, UserKind::Student));
    store.insert_user(common::school_user(11, UserKind::Student));
    store.insert_user(common::school_user(12, UserKind::Student));
    store.insert_channel(5, 1, 11);

    let resp = server
        .get("/api/v1/chats/students")
        .add_header(AUTHORIZATION, bearer(&common::token_for(1, UserKind::Teacher)))
        .await;

    resp.assert_status_ok();
    let body: Vec<serde_json::Value> = resp.json();
    let mut ids: Vec<i64> = body.iter().map(|u| u["id"].as_i64().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![10, 12]);
}

#[tokio::test]
async fn student_chatters_require_teacher_role() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .get("/api/v1/chats/students")
        .add_header(AUTHORIZATION, bearer(&common::token_for(10, UserKind::Student)))
        .await;

    resp.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn teacher_chatters_for_student() {
    let (app, _state, store) = common::test_app();
    let server = TestServer::new(app).unwrap();
    store.insert_user(common::school_user(1, UserKind::Teacher));
    store.insert_user(common::school_user(2, UserKind::Teacher));
    store.insert_user(common::school_user(10, UserKind::Student));
    store.insert_channel(5, 2, 10);

    let resp = server
        .get("/api/v1/chats/teachers")
        .add_header(AUTHORIZATION, bearer(&common::token_for(10, UserKind::Student)))
        .await;

    resp.assert_status_ok();
    let body: Vec<serde_json::Value> = resp.json();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["id"], 1);
    assert_eq!(body[0]["userKind"], 1);
}
