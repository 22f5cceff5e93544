//! Chat channel endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use school_common::UserKind;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::auth::tokens::AuthenticatedUser;
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::channel::{Channel, ChannelWithMessages};
use crate::models::user::User;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chats/channel", get(list_channels).post(create_channel))
        .route("/chats/channel/{id}", get(get_channel))
        .route("/chats/students", get(list_student_chatters))
        .route("/chats/teachers", get(list_teacher_chatters))
}

// ---------------------------------------------------------------------------
// POST /api/v1/chats/channel
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    pub first_user_id: Option<i64>,
    pub second_user_id: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/chats/channel",
    tag = "Chat",
    security(("bearer" = [])),
    request_body = CreateChannelRequest,
    responses(
        (status = 201, description = "Channel created", body = Channel),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Caller is not a participant", body = ApiErrorBody),
        (status = 409, description = "Channel already exists", body = ApiErrorBody),
    ),
)]
pub async fn create_channel(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<Channel>), ApiError> {
    let mut errors = Vec::new();
    if body.first_user_id.is_none() {
        errors.push(FieldError {
            field: "firstUserId".to_string(),
            message: "firstUserId is required".to_string(),
        });
    }
    if body.second_user_id.is_none() {
        errors.push(FieldError {
            field: "secondUserId".to_string(),
            message: "secondUserId is required".to_string(),
        });
    }
    let (Some(first), Some(second)) = (body.first_user_id, body.second_user_id) else {
        return Err(ApiError::validation(errors));
    };

    if first == second {
        return Err(ApiError::validation(vec![FieldError {
            field: "secondUserId".to_string(),
            message: "A channel needs two different users".to_string(),
        }]));
    }
    if user.id != first && user.id != second {
        return Err(ApiError::forbidden("You can only create channels you take part in"));
    }

    let channel = state.store.create_channel(first, second).await?;
    tracing::info!(channel_id = channel.id, user_id = user.id, "chat channel created");

    Ok((StatusCode::CREATED, Json(channel)))
}

// ---------------------------------------------------------------------------
// GET /api/v1/chats/channel
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/chats/channel",
    tag = "Chat",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Channels of the caller", body = Vec<Channel>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_channels(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Channel>>, ApiError> {
    let channels = state.store.list_channels_for_user(user.id).await?;
    Ok(Json(channels))
}

// ---------------------------------------------------------------------------
// GET /api/v1/chats/channel/{id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/chats/channel/{id}",
    tag = "Chat",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Channel ID")),
    responses(
        (status = 200, description = "Channel with its messages", body = ChannelWithMessages),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Caller is not a participant", body = ApiErrorBody),
        (status = 404, description = "Channel not found", body = ApiErrorBody),
    ),
)]
pub async fn get_channel(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ChannelWithMessages>, ApiError> {
    let channel = state
        .store
        .get_channel_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Channel not found"))?;

    if !channel.has_participant(user.id) {
        return Err(ApiError::forbidden("You are not a participant of this channel"));
    }

    let messages = state.store.list_messages(id).await?;
    Ok(Json(ChannelWithMessages { channel, messages }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/chats/students, GET /api/v1/chats/teachers
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/chats/students",
    tag = "Chat",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Students the caller has no channel with yet", body = Vec<User>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Teachers only", body = ApiErrorBody),
    ),
)]
pub async fn list_student_chatters(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    let user = auth.require(UserKind::Teacher)?;
    possible_chatters(&state, user, UserKind::Student).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/api/v1/chats/teachers",
    tag = "Chat",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Teachers the caller has no channel with yet", body = Vec<User>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_teacher_chatters(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    let user = auth.require(UserKind::Student)?;
    possible_chatters(&state, user, UserKind::Teacher).await.map(Json)
}

/// Users of `kind` in the caller's school that the caller has no channel with.
async fn possible_chatters(
    state: &AppState,
    user: &AuthenticatedUser,
    kind: UserKind,
) -> Result<Vec<User>, ApiError> {
    let school_id = user
        .school_id
        .ok_or_else(|| ApiError::bad_request("You are not attached to a school"))?;

    let candidates = state.store.list_school_users(school_id, kind).await?;
    let existing = state.store.list_channels_for_user(user.id).await?;

    Ok(candidates
        .into_iter()
        .filter(|candidate| candidate.id != user.id)
        .filter(|candidate| !existing.iter().any(|c| c.has_participant(candidate.id)))
        .collect())
}
