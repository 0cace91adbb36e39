//! Error envelope types.
//!
//! Every failure reported to a client is serialized as the same two-field
//! JSON object:
//!
//! ```json
//! {"code": "InvalidParameter", "message": "invalid parameter"}
//! ```
//!
//! Envelopes are built either from a predefined [`ErrorKind`] or from a
//! caller-supplied code and message via [`ResponseError::custom`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Predefined error kinds with a fixed code and message.
///
/// Adding a kind means adding a variant here *and* an entry in
/// `ERROR_MESSAGES`. A kind without a table entry serializes with an empty
/// message rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unexpected server-side failure.
    InternalError,
    /// Malformed or unreadable client input.
    InvalidParameter,
    /// Generic client-side violation.
    BadRequest,
}

const ERROR_MESSAGES: &[(ErrorKind, &str)] = &[
    (ErrorKind::InternalError, "internal error"),
    (ErrorKind::InvalidParameter, "invalid parameter"),
    (ErrorKind::BadRequest, "bad request"),
];

impl ErrorKind {
    /// Returns every predefined kind.
    #[must_use]
    pub const fn all() -> [ErrorKind; 3] {
        [Self::InternalError, Self::InvalidParameter, Self::BadRequest]
    }

    /// Returns the machine-readable code, which is the kind's name.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InternalError => "InternalError",
            Self::InvalidParameter => "InvalidParameter",
            Self::BadRequest => "BadRequest",
        }
    }

    /// Returns the human-readable message from the message table.
    #[must_use]
    pub fn message(self) -> &'static str {
        ERROR_MESSAGES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or("", |(_, message)| message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A structured error carrying a stable code and a message.
///
/// Immutable once constructed.
///
/// # Example
///
/// ```
/// use logcollector_core::{ErrorKind, ResponseError};
///
/// let err = ResponseError::new(ErrorKind::BadRequest);
/// assert_eq!(err.to_json_bytes().as_ref(), br#"{"code":"BadRequest","message":"bad request"}"#);
///
/// let custom = ResponseError::custom("QuotaExceeded", "too many logs");
/// assert_eq!(custom.code(), "QuotaExceeded");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct ResponseError {
    code: String,
    message: String,
}

impl ResponseError {
    /// Creates an error from a predefined kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            code: kind.code().to_string(),
            message: kind.message().to_string(),
        }
    }

    /// Creates an error with an arbitrary code and message.
    #[must_use]
    pub fn custom(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Returns the machine-readable code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Serializes the envelope to JSON.
    ///
    /// Encoding two strings cannot fail, so a failure is swallowed and
    /// yields an empty buffer instead of an error.
    #[must_use]
    pub fn to_json_bytes(&self) -> Bytes {
        serde_json::to_vec(self).map(Bytes::from).unwrap_or_default()
    }
}

impl From<ErrorKind> for ResponseError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}
