//! Bearer token extraction for the REST routes.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use school_common::UserKind;

use crate::auth::tokens::{self, AuthenticatedUser, CredentialError};
use crate::error::ApiError;
use crate::AppState;

/// Authenticated user extracted from the `Authorization: Bearer <jwt>` header.
///
/// Any authenticated role is accepted; handlers that need more call
/// [`AuthUser::require`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl AuthUser {
    pub fn require(&self, min_role: UserKind) -> Result<&AuthenticatedUser, ApiError> {
        if self.0.kind.at_least(min_role) {
            Ok(&self.0)
        } else {
            Err(ApiError::forbidden("You are not allowed to access this resource"))
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InsufficientRole => {
                ApiError::forbidden("You are not allowed to access this resource")
            }
            other => ApiError::unauthorized(other.message()),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let user = tokens::validate_credential(&state.config.jwt_secret, token, UserKind::Student)?;
        Ok(AuthUser(user))
    }
}
