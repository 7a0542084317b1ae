use thiserror::Error;

/// Errors that can occur while setting up or running a delayed-feedback
/// session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DelayError {
    #[error("audio device not found: {0}")]
    DeviceNotFound(String),

    #[error("failed to open device stream: {0}")]
    DeviceOpen(String),

    #[error("recording is already started")]
    AlreadyStarted,

    #[error("recording is not started")]
    NotStarted,

    /// Finalize failed after staging completed. The staging file is left
    /// on disk for manual recovery and its path is carried here.
    #[error("failed to finalize recording (staging file kept at {staging}): {reason}")]
    Finalize { staging: String, reason: String },

    #[error("block shape mismatch: expected {expected} samples, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("device stream error: {0}")]
    Stream(String),
}
