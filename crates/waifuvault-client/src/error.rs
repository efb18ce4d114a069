//! Client error types

use crate::types::ErrorEnvelope;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Bad local input, rejected before any request is sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// The HTTP transport could not complete the round trip
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response could not be interpreted
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The service answered with a structured error body
    #[error("Remote error ({}, status {}): {}", .0.name, .0.status, .0.message)]
    Remote(ErrorEnvelope),

    /// The service rejected the supplied password
    #[error("Access denied: {0}")]
    Auth(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl ClientError {
    /// Check if this error was raised by local validation
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a password rejection
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Check if the service reported the entry as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote(envelope) if envelope.status == 404)
    }

    /// The remote error envelope, if the service sent one
    pub fn envelope(&self) -> Option<&ErrorEnvelope> {
        match self {
            Self::Remote(envelope) => Some(envelope),
            _ => None,
        }
    }
}
