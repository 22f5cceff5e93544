//! HS256 user tokens: issuance and per-request validation.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use school_common::UserKind;
use serde::{Deserialize, Serialize};

/// Token lifetime (24 hours).
pub const TOKEN_TTL_HOURS: i64 = 24;

/// The user snapshot embedded in a token at login time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUser {
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    pub user_kind: UserKind,
    #[serde(default)]
    pub school_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    pub user: TokenUser,
    pub exp: i64,
}

/// Identity extracted from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub kind: UserKind,
    pub school_id: Option<i64>,
}

/// Why a credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    Missing,
    Invalid,
    Expired,
    InsufficientRole,
}

impl CredentialError {
    pub fn message(self) -> &'static str {
        match self {
            Self::Missing => "Missing token",
            Self::Invalid => "Invalid token",
            Self::Expired => "Expired token",
            Self::InsufficientRole => "Insufficient role",
        }
    }
}

/// Sign a token for `user` that expires in [`TOKEN_TTL_HOURS`].
pub fn generate(secret: &str, user: &TokenUser) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);
    sign(secret, user, exp.timestamp())
}

/// Sign a token with an explicit `exp` (unix seconds).
pub fn sign(
    secret: &str,
    user: &TokenUser,
    exp: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = UserClaims {
        user: user.clone(),
        exp,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate a token and check the holder's role against `min_role`.
///
/// Checks the HS256 signature, `exp` (no leeway), and that the embedded
/// user kind is at least `min_role`.
pub fn validate_credential(
    secret: &str,
    token: &str,
    min_role: UserKind,
) -> Result<AuthenticatedUser, CredentialError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CredentialError::Missing);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let data = jsonwebtoken::decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(?e, "token validation failed");
        match e.kind() {
            ErrorKind::ExpiredSignature => CredentialError::Expired,
            _ => CredentialError::Invalid,
        }
    })?;

    let user = data.claims.user;
    if !user.user_kind.at_least(min_role) {
        return Err(CredentialError::InsufficientRole);
    }

    Ok(AuthenticatedUser {
        id: user.id,
        kind: user.user_kind,
        school_id: user.school_id,
    })
}
