//! Error types for the Ghostfest registration library.
//!
//! Every fallible operation in the crate returns [`GhostfestError`]. The RPC
//! layer turns these into JSON-RPC error codes via
//! [`GhostfestError::to_rpc_error_code`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Ghostfest library.
#[derive(Debug, Error)]
pub enum GhostfestError {
    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Request errors
    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid order code: {0}")]
    InvalidOrderCode(String),

    // Lookup errors
    #[error("Submission not found: {0}")]
    SubmissionNotFound(String),

    // Intake state
    #[error("Submissions are currently closed")]
    IntakePaused,

    // Access control
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Login required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    // Undo / restore
    #[error("{0}")]
    UndoUnavailable(String),

    #[error("{0}")]
    Conflict(String),

    // Dispatch
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for Ghostfest operations.
pub type Result<T> = std::result::Result<T, GhostfestError>;

impl From<std::io::Error> for GhostfestError {
    fn from(err: std::io::Error) -> Self {
        GhostfestError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for GhostfestError {
    fn from(err: serde_json::Error) -> Self {
        GhostfestError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for GhostfestError {
    fn from(err: rusqlite::Error) -> Self {
        GhostfestError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl GhostfestError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        GhostfestError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Shorthand for a field validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        GhostfestError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Standard JSON-RPC error codes:
    /// - -32601: Method not found
    /// - -32602: Invalid params
    /// - -32603: Internal error
    ///
    /// Application-defined codes:
    /// - -32001: Submission not found
    /// - -32005: Validation error
    /// - -32010: Not logged in / bad credentials
    /// - -32011: Role not permitted
    /// - -32012: Intake paused
    /// - -32013: Conflict or nothing to undo
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            GhostfestError::MethodNotFound(_) => -32601,

            GhostfestError::InvalidParams { .. } => -32602,

            GhostfestError::SubmissionNotFound(_) => -32001,

            GhostfestError::Validation { .. } | GhostfestError::InvalidOrderCode(_) => -32005,

            GhostfestError::InvalidCredentials | GhostfestError::Unauthorized => -32010,

            GhostfestError::Forbidden(_) => -32011,

            GhostfestError::IntakePaused => -32012,

            GhostfestError::UndoUnavailable(_) | GhostfestError::Conflict(_) => -32013,

            // All other errors are internal errors
            _ => -32603,
        }
    }
}
