use std::io;
use thiserror::Error;

use crate::brain::input_guard::InvalidInput;

/// Application-wide error type, consolidating all possible errors into a single enum.
#[derive(Debug, Error)]
pub enum AppError {
    /// The user message failed input validation. Never shown verbatim to the user.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// A collaborator (role resolver, knowledge search, live data, logger) failed.
    #[error("Collaborator '{collaborator}' failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    /// Composing a reply failed (missing template family, analysis failure, ...).
    #[error("Generation error: {0}")]
    Generation(String),

    /// The post-processing pass could not produce a usable reply.
    #[error("Post-processing error: {0}")]
    PostProcessing(String),

    /// Represents data validation errors (e.g., out-of-range configuration values).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., unparsable environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Represents errors from operations that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a collaborator failure.
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        AppError::Collaborator {
            collaborator,
            message: message.into(),
        }
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::InvalidInput(e) => AppError::InvalidInput(e.clone()),
            AppError::Collaborator {
                collaborator,
                message,
            } => AppError::Collaborator {
                collaborator: *collaborator,
                message: message.clone(),
            },
            AppError::Generation(s) => AppError::Generation(s.clone()),
            AppError::PostProcessing(s) => AppError::PostProcessing(s.clone()),
            AppError::Validation(s) => AppError::Validation(s.clone()),
            AppError::Config(s) => AppError::Config(s.clone()),
            AppError::Timeout(s) => AppError::Timeout(s.clone()),
            AppError::Io(e) => AppError::Io(io::Error::new(e.kind(), e.to_string())),
            AppError::Internal(s) => AppError::Internal(s.clone()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(format!("Operation timed out: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::Config(format!("Invalid integer: {}", err))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(err: std::num::ParseFloatError) -> Self {
        AppError::Config(format!("Invalid number: {}", err))
    }
}
