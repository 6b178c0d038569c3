//! Error types for preferences validation and persistence

use thiserror::Error;

/// Rejected preference values. Callers validate before handing a config to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be at least 1, got {value}")]
    BelowMinimum { field: &'static str, value: u32 },

    #[error("{field} must be at most {max}, got {value}")]
    AboveMaximum { field: &'static str, value: u32, max: u32 },

    #[error("soundVolume must be between 0 and 100, got {0}")]
    VolumeOutOfRange(u32),
}

/// Failures reported by a preferences store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the session token
    #[error("Authentication required or token expired (status {0})")]
    Unauthorized(u16),

    #[error("Preferences not found")]
    NotFound,

    #[error("Unexpected response status: {0}")]
    Status(u16),
}
