//! Error types for the PolyAnalyst API client.
//!
//! # Design
//! One variant per failure stage so callers can branch on the kind of
//! failure instead of matching message text. `BadStatus` keeps the raw status
//! code and body for diagnostics. There is no dedicated 401 variant; callers
//! that renew sessions match `BadStatus { status: 401, .. }`.

use thiserror::Error;

/// Errors returned by `Session` build/parse methods and by `Client`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be constructed (malformed base URL or path).
    #[error("building request error: {0}")]
    RequestBuild(String),

    /// The HTTP call itself failed (DNS, refused connection, reset).
    #[error("request execution error: {0}")]
    Transport(String),

    /// The server answered with a status other than 200 or 202.
    #[error("bad response status: {status}. Error: {body}")]
    BadStatus { status: u16, body: String },

    /// The status was acceptable but the body could not be fully read.
    #[error("failed to read response: {0}")]
    BodyRead(String),

    /// The body was read but did not match the expected JSON shape.
    #[error("decoding response failed: {0}")]
    Decode(String),

    /// A request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status carried by a `BadStatus` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
