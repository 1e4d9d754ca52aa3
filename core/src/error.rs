//! Error types for the database client.
//!
//! # Design
//! Each failure stage gets its own variant so callers can tell a request that
//! never left the process (`InvalidPath`, `Serialization`) from one that failed
//! on the wire (`Transport`) or was rejected by the server (`Remote`), and from
//! a success whose body did not fit the target type (`Decode`).

use thiserror::Error;

/// Boxed error used as the source of a `TransportError`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `DatabaseClient` operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// The path contains a character the database forbids in keys.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// The value could not be encoded as JSON. No request was sent.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The transport could not complete the round trip.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a status outside 200..=299.
    #[error("remote error: {status}{}", reason_suffix(.reason))]
    Remote { status: u16, reason: String },

    /// The response body could not be decoded into the requested type.
    #[error("deserialization failed: {0}")]
    Decode(#[source] serde_json::Error),
}

impl DbError {
    /// Status code of a `Remote` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            DbError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Unlisted statuses carry no reason phrase; the separator goes with it.
fn reason_suffix(reason: &str) -> String {
    if reason.is_empty() {
        String::new()
    } else {
        format!(" {reason}")
    }
}

/// Failure raised by a `Transport` before any HTTP response was available.
#[derive(Debug, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying I/O or client error, keeping it as the source.
    pub fn from_source(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self {
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
