//! Error types for cadence-engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid recurrence rule: missing FREQ")]
    MissingFrequency,

    #[error("Invalid recurrence rule: unsupported FREQ '{0}'")]
    UnsupportedFrequency(String),

    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid datetime: {0}")]
    InvalidDateTime(String),

    #[error("Invalid event records: {0}")]
    InvalidRecords(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
