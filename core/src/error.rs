//! Error types for the projects API client.
//!
//! # Design
//! Every failure collapses into one of two kinds. `Transport` covers
//! everything that happens on the client's side of the wire: the request
//! could not be sent, its payload could not be encoded, the response body
//! could not be decoded, or the input was rejected before sending. `Server`
//! covers every non-2xx response and carries the server's `detail` text,
//! which is also what the error displays as.

use thiserror::Error;

/// Prefix that marks a failure as client-side in user-facing text.
pub const CLIENT_SIDE_PREFIX: &str = "client side Error: ";

/// Discriminant of an `ApiError`, for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Server,
}

/// Errors returned by every `ProjectClient` and `ProjectService` operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No usable response: network failure, encoding/decoding failure or
    /// invalid input caught before sending.
    #[error("client side Error: {message}")]
    Transport { message: String },

    /// The server answered with a non-2xx status.
    #[error("{detail}")]
    Server { status: u16, detail: String },
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Transport {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport { .. } => ErrorKind::Transport,
            ApiError::Server { .. } => ErrorKind::Server,
        }
    }

    /// HTTP status of a server failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Failure raised by a `Transport` when no response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Transport {
            message: err.message,
        }
    }
}
