//! Error types for Lodestone
//!
//! A single taxonomy covers the whole client: remote failures carry the
//! server's status and message, and everything else is a local encode,
//! decode, or configuration problem. No recovery or retry happens at this
//! layer; callers inspect the status to disambiguate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LodestoneError {
    // Remote API errors
    #[error("API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    // Transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Async task errors
    #[error("Task {task_id} failed: {message}")]
    TaskFailed { task_id: String, message: String },

    #[error("Task {task_id} did not complete before the deadline")]
    TaskTimeout { task_id: String },
}

impl LodestoneError {
    /// Remote failure with the conventional not-found status.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LodestoneError::Api { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, LodestoneError>;
