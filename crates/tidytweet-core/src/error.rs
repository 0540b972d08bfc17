use thiserror::Error;

use crate::collect::SourceError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}missing required field '{field}'", line_prefix(.line))]
    MissingField { line: Option<usize>, field: String },

    #[error("{}invalid record: {reason}", line_prefix(.line))]
    InvalidRecord { line: Option<usize>, reason: String },

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("Invalid value for {option}: {value}")]
    InvalidOption { option: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

impl Error {
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            line: None,
            field: field.into(),
        }
    }

    /// Attaches a 1-based input line number to record-level errors.
    #[must_use]
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Self::MissingField { field, .. } => Self::MissingField {
                line: Some(line),
                field,
            },
            Self::InvalidRecord { reason, .. } => Self::InvalidRecord {
                line: Some(line),
                reason,
            },
            Self::Json(e) => Self::InvalidRecord {
                line: Some(line),
                reason: e.to_string(),
            },
            other => other,
        }
    }
}

fn line_prefix(line: &Option<usize>) -> String {
    line.map_or_else(String::new, |n| format!("line {n}: "))
}

pub type Result<T> = std::result::Result<T, Error>;
