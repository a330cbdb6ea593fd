use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to fetch {source_name}: {reason}")]
    FetchFailure { source_name: String, reason: String },

    #[error("Unknown trip type '{0}'")]
    UnknownTripType(String),

    #[error("Unknown trip status '{0}'")]
    UnknownStatus(String),

    #[error("Unknown report kind '{0}'")]
    UnknownReport(String),

    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: String, to: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReportError {
    pub fn fetch(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailure {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
