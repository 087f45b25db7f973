//! Result and error types for the core library

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-field validation messages, keyed by field name
///
/// Ordered so that messages render in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. The first message per field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for a single field, if that field failed
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing failed
    pub fn into_result(self) -> std::result::Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Failure of a query or mutation against the dashboard API
///
/// Cloneable so the same error can sit in the query cache and be handed to
/// every subscriber of that entry.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    /// The request never reached the server or no response came back
    #[error("Network error: {message}")]
    Transport { message: String },

    #[error("Request timed out after {} seconds", .after.as_secs())]
    Timeout { after: Duration },

    /// Non-2xx response
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    /// Rejected on the client before any request was sent
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// HTTP status code, when the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether retrying the same request could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Server { status, .. } => *status >= 500 || *status == 429,
            Self::Decode { .. } | Self::Validation(_) => false,
        }
    }
}

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Log database error: {0}")]
    LogDatabase(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::LogDatabase(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation outcome for `--json` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    /// Field-level messages when the failure was a validation error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            fields: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            fields: None,
        }
    }

    /// Transform the payload, keeping the outcome
    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        OperationResult {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            fields: self.fields,
        }
    }
}

impl<T> From<std::result::Result<T, ApiError>> for OperationResult<T> {
    fn from(result: std::result::Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(ApiError::Validation(fields)) => Self {
                success: false,
                data: None,
                error: Some("Validation failed".to_string()),
                fields: Some(fields),
            },
            Err(e) => Self::fail(e.to_string()),
        }
    }
}
