//! Error types for calendar-lens operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Nonexistent local time: {0}")]
    NonexistentLocalTime(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid bucket spec: {0}")]
    InvalidBucket(String),

    #[error("Invalid granularity: {0}")]
    InvalidGranularity(String),

    #[error("Unknown property on line {line}: {name}")]
    UnknownProperty { line: usize, name: String },

    #[error("Incomplete event ending on line {line}: {reason}")]
    IncompleteEvent { line: usize, reason: String },

    #[error("Row is not tabular: {0}")]
    NotTabular(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LensError {
    /// Whether this error is a value-format failure (datetime, duration, zone).
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            LensError::InvalidTimezone(_)
                | LensError::InvalidDatetime(_)
                | LensError::InvalidDuration(_)
                | LensError::NonexistentLocalTime(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LensError>;
