//! Error types for filterdeck
//!
//! Every variant is locally recoverable: fetch and parse failures clear the
//! loaded data, input failures keep the previous value, URL failures block the
//! request.

use thiserror::Error;

/// Result type for core and service operations
pub type Result<T> = std::result::Result<T, FilterDeckError>;

#[derive(Debug, Error)]
pub enum FilterDeckError {
    /// Network error or non-2xx response
    #[error("Request failed: {0}")]
    FetchFailed(String),

    /// Response body is not usable JSON
    #[error("Invalid response data: {0}")]
    ParseFailed(String),

    /// A condition value failed operator-specific validation
    #[error("{message}")]
    InvalidInputValue { field: String, message: String },

    /// The source URL failed the shape check
    #[error("Invalid URL: {0}. Enter a host name, localhost or IPv4 address, optionally with http(s)://, a port and a path")]
    InvalidUrl(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FilterDeckError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInputValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors that wipe the loaded dataset
    pub fn clears_data(&self) -> bool {
        matches!(self, Self::FetchFailed(_) | Self::ParseFailed(_))
    }
}

impl From<reqwest::Error> for FilterDeckError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::FetchFailed(format!("Request failed with status {}", status.as_u16())),
            None => Self::FetchFailed(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for FilterDeckError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseFailed(err.to_string())
    }
}

impl From<csv::Error> for FilterDeckError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}
