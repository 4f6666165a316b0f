//! Crate-wide error type.
//!
//! Errors only travel as far as the component boundary: searchers turn
//! them into [`SearchOutcome::Unavailable`](crate::search::SearchOutcome)
//! and the composer turns them into the next fallback tier. The CLI and
//! server entry points are the only places that surface them to a caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuataError {
    /// Transport-level failure talking to an edge function or search API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Payload could not be decoded into the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A backend is not configured or was skipped.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GuataError>;
