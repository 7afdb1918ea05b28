// Domain errors - Error taxonomy shared by every layer

use thiserror::Error;

/// Domain-specific error types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    /// Missing or malformed match data
    #[error("Invalid match data: {0}")]
    InputData(String),

    /// Unknown anchor, missing required field, out-of-range setting
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The external engine reported failure for a specific job
    #[error("Job {job} ({stage}) failed: {message}")]
    TranscodeJob {
        job: String,
        stage: String,
        message: String,
    },

    /// Duration or metadata probe failed
    #[error("Failed to probe {path}: {message}")]
    Probe { path: String, message: String },

    /// Job was stopped because a sibling job failed
    #[error("Job {0} cancelled")]
    Cancelled(String),

    /// Working directory operation failed
    #[error("File system error: {0}")]
    FsFail(String),
}

impl DomainError {
    /// Errors raised before any transcode job is submitted
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            DomainError::InputData(_) | DomainError::Configuration(_)
        )
    }
}
