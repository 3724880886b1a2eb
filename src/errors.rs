//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the sighting board, providing the error types
//! shared by the store, configuration loader, and API layer.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from configuration, request validation, serialization
//! - **Output**: Structured error types with context
//! - **Error Categories**: Validation, Configuration, Internal
//!
//! ## Key Features
//! - Validation failures carry the offending field for client-facing messages
//! - Unexpected failures collapse into `Internal` and are logged, never exposed in detail
//! - Automatic conversion from common library error types

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Error types for the sighting board
#[derive(Debug, Error)]
pub enum ScoutError {
    /// Caller-supplied input failed required-field or type checks
    #[error("Validation failed for field '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ScoutError {
    /// Shorthand for a validation failure on a named field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ScoutError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True when the error is the caller's fault and maps to a 400 response
    pub fn is_client_error(&self) -> bool {
        matches!(self, ScoutError::Validation { .. })
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            ScoutError::Validation { .. } => "validation",
            ScoutError::Config { .. } => "configuration",
            ScoutError::Internal { .. } => "internal",
            ScoutError::Io(_) => "io",
            ScoutError::Json(_) | ScoutError::Toml(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        let err = ScoutError::validation("jobId", "required");
        assert!(err.is_client_error());
        assert_eq!(err.category(), "validation");
        assert_eq!(
            err.to_string(),
            "Validation failed for field 'jobId': required"
        );
    }

    #[test]
    fn internal_errors_are_not_client_errors() {
        let err = ScoutError::Internal {
            message: "boom".to_string(),
        };
        assert!(!err.is_client_error());
        assert_eq!(err.category(), "internal");
    }
}
