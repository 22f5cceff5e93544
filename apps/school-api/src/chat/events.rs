//! Chat socket notifications and frame error categories.

use axum::extract::ws::Utf8Bytes;
use school_common::DeliveredMessage;
use serde::Serialize;

use crate::auth::tokens::CredentialError;

// ---------------------------------------------------------------------------
// Close codes (RFC 6455)
// ---------------------------------------------------------------------------

pub const CLOSE_INVALID_PAYLOAD: u16 = 1007;
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

// ---------------------------------------------------------------------------
// Recoverable frame errors
// ---------------------------------------------------------------------------

/// A frame was rejected. The connection stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Not JSON, `content` missing, or a field of the wrong type.
    InvalidPayload,
    /// Token missing, invalid, expired, or role too low.
    Unauthorized(CredentialError),
    /// Channel does not exist or the sender is not a participant.
    Forbidden,
    /// The message could not be stored.
    Internal,
}

impl FrameError {
    pub fn close_code(self) -> u16 {
        match self {
            Self::InvalidPayload => CLOSE_INVALID_PAYLOAD,
            Self::Unauthorized(_) | Self::Forbidden => CLOSE_POLICY_VIOLATION,
            Self::Internal => CLOSE_INTERNAL_ERROR,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::InvalidPayload => "Invalid message format",
            Self::Unauthorized(CredentialError::Missing) => "JWT token required",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::Internal => "Internal server error",
        }
    }

    pub fn notification(self) -> Notification {
        Notification {
            kind: "error",
            code: self.close_code(),
            reason: self.reason(),
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client payloads
// ---------------------------------------------------------------------------

/// Error notice sent to the client that produced a rejected frame.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub code: u16,
    pub reason: &'static str,
}

impl Notification {
    pub fn encode(&self) -> Utf8Bytes {
        encode_json(self)
    }
}

/// Encode a persisted message for broadcast.
pub fn encode_delivered(message: &DeliveredMessage) -> Utf8Bytes {
    encode_json(message)
}

fn encode_json<T: Serialize>(value: &T) -> Utf8Bytes {
    // Plain structs with string keys always serialize.
    serde_json::to_string(value)
        .unwrap_or_else(|_| String::from("{}"))
        .into()
}
