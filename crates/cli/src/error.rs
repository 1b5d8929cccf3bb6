//! Error types for the pulse admin client.

use thiserror::Error;

/// Errors from the admin HTTP client.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to reach the server at all.
    #[error("connection error: {0}")]
    Connection(String),

    /// Server responded but the body didn't parse as expected.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Server returned a non-success status with an `{"error": ...}` body.
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },

    /// Server returned a non-success status we couldn't parse a body for.
    #[error("http {status}")]
    HttpUnparsed { status: u16 },
}
