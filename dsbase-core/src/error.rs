//! Error types for the ds client
//!
//! Two channels, never mixed:
//! - `UsageError`: a call was made with bad arguments or missing
//!   configuration. Raised before any request is built. Always code 400.
//! - `ApiError`: the outcome of a request that was actually sent. Every
//!   variant maps to a single integer code.

use thiserror::Error;

use crate::session::StoreError;

/// Code reported for failures without an HTTP status
pub const FALLBACK_CODE: u16 = 500;

/// Code reported when a downloaded object is not valid JSON
pub const NOT_JSON_CODE: u16 = 415;

/// Code reported for invalid calls
pub const USAGE_CODE: u16 = 400;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
}

impl UsageError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> u16 {
        USAGE_CODE
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("Transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Response body is malformed: {0}")]
    MalformedBody(String),

    #[error("Downloaded object is not valid JSON: {0}")]
    NotJson(String),

    #[error("Login response carries no token")]
    MissingToken,

    #[error("Session token could not be stored: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// The integer code surfaced to callers
    pub fn code(&self) -> u16 {
        match self {
            ApiError::Status(0) => FALLBACK_CODE,
            ApiError::Status(status) => *status,
            ApiError::NotJson(_) => NOT_JSON_CODE,
            ApiError::Transport(_)
            | ApiError::MalformedBody(_)
            | ApiError::MissingToken
            | ApiError::Store(_) => FALLBACK_CODE,
        }
    }
}
