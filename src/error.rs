// src/error.rs

//! Unified error handling for the announcement monitor.
//!
//! `AppError` covers setup concerns (configuration, client construction).
//! `FetchError` is the taxonomy a single refresh attempt can fail with; it
//! never escapes the scheduler and is recorded as an [`ErrorInfo`] instead.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for setup operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A refresh attempt failed outside of a monitor
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Why a single fetch of a municipality page failed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The remote answered 404 for the computed URL.
    #[error("Municipality page not found: {url}")]
    NotFound { url: String },

    /// Transport failure, or any non-2xx status other than 404.
    #[error("Error connecting to Planviewer: {0}")]
    Connection(String),

    /// The response arrived but could not be turned into records.
    #[error("Error while scraping data: {0}")]
    Data(String),
}

impl FetchError {
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::NotFound { url: url.into() }
    }

    pub fn connection(message: impl fmt::Display) -> Self {
        Self::Connection(message.to_string())
    }

    pub fn data(message: impl fmt::Display) -> Self {
        Self::Data(message.to_string())
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Data(_) => ErrorKind::Data,
        }
    }
}

/// Classification of a failed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Connection,
    Data,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Connection => "connection",
            ErrorKind::Data => "data",
        };
        f.write_str(name)
    }
}

/// Cloneable record of the last refresh failure, kept in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&FetchError> for ErrorInfo {
    fn from(err: &FetchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_kind() {
        assert_eq!(FetchError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(FetchError::connection("refused").kind(), ErrorKind::Connection);
        assert_eq!(FetchError::data("bad").kind(), ErrorKind::Data);
    }

    #[test]
    fn test_error_info_from_fetch_error() {
        let err = FetchError::not_found("https://www.planviewer.nl/lb/overheid/nowhere");
        let info = ErrorInfo::from(&err);
        assert_eq!(info.kind, ErrorKind::NotFound);
        assert!(info.message.contains("/lb/overheid/nowhere"));
    }
}
