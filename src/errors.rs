//! RKSOK Error Types
//!
//! This module defines the error type used across the crate, covering the
//! failure classes the protocol engine distinguishes: framing and parsing
//! problems, storage faults, transport issues, and timeouts.

use thiserror::Error;

/// The main Error type for the RKSOK library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-related errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// A request that does not follow the protocol (bad framing or parsing)
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// Persisted-state read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Bytes that do not decode in the configured text encoding
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request timeout
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// Whether the client caused this error. Client faults are answered with
    /// the unrecognized-request response; everything else is a server-side
    /// fault that gets logged before the same generic answer goes out.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Error::Malformed(_) | Error::Encoding(_))
    }
}
