//! Error types for taxonomy-explorer.
//!
//! This module provides error handling following the thiserror pattern.
//! Error types are designed to be informative, actionable, and suitable for both
//! programmatic handling and user-facing display.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for taxonomy-explorer operations.
#[derive(Error, Debug)]
pub enum ExplorerError {
    /// A flat row references a parent that was never seen.
    #[error("Integrity error: row '{path}' references missing parent '{parent_path}'")]
    IntegrityError {
        /// Path of the orphaned row.
        path: String,
        /// Parent path the row declared.
        parent_path: String,
    },

    /// Flat row input is structurally invalid (e.g. two roots).
    #[error("Malformed row input: {message}")]
    MalformedRows {
        /// Human-readable error message.
        message: String,
    },

    /// Node not found in the remote store.
    #[error("Node not found: {path}")]
    NodeNotFound {
        /// Path that was not found.
        path: String,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// HTTP transport failed before a response was received.
    #[error("Request to {url} failed")]
    HttpError {
        /// URL of the failed request.
        url: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("API returned {status}: {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, or the status text.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Human-readable error message.
        message: String,
    },

    /// Invalid configuration file contents.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {context}")]
    IoError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {context}")]
    SerializationError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// TUI error.
    #[error("TUI error: {message}")]
    TuiError {
        /// Human-readable error message.
        message: String,
    },

    /// Interrupted operation.
    #[error("Operation interrupted")]
    Interrupted,

    /// Unsupported operation or feature.
    #[error("Unsupported: {feature}")]
    Unsupported {
        /// Name of the unsupported feature.
        feature: String,
    },

    /// Invalid argument.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Name of the invalid argument.
        name: String,
        /// Reason why the argument is invalid.
        reason: String,
    },
}

impl ExplorerError {
    /// Create a new integrity error for an orphaned row.
    #[must_use]
    pub fn integrity(path: impl Into<String>, parent_path: impl Into<String>) -> Self {
        Self::IntegrityError {
            path: path.into(),
            parent_path: parent_path.into(),
        }
    }

    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Create a new HTTP transport error.
    #[must_use]
    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::HttpError {
            url: url.into(),
            source,
        }
    }

    /// Create a new invalid argument error.
    #[must_use]
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new unsupported error.
    #[must_use]
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::IntegrityError { .. } | Self::MalformedRows { .. } => exit_codes::EXIT_DATA_ERROR,
            Self::NodeNotFound { .. } | Self::FileNotFound { .. } => exit_codes::EXIT_NOT_FOUND,
            Self::HttpError { .. } | Self::ApiError { .. } => exit_codes::EXIT_API_ERROR,
            Self::ConfigError { .. } | Self::InvalidConfig { .. } => exit_codes::EXIT_CONFIG_ERROR,
            Self::InvalidArgument { .. } => exit_codes::EXIT_USAGE_ERROR,
            Self::Interrupted => exit_codes::EXIT_INTERRUPTED,
            Self::IoError { .. } => exit_codes::EXIT_IO_ERROR,
            _ => exit_codes::EXIT_GENERAL_ERROR,
        }
    }

    /// Check if this error is worth retrying by re-issuing the same request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError { source, .. } => source.is_timeout() || source.is_connect(),
            Self::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for taxonomy-explorer operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;

impl From<std::io::Error> for ExplorerError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            context: "JSON operation failed".to_string(),
            source: err,
        }
    }
}

/// Exit codes for CLI operations.
pub mod exit_codes {
    /// Operation completed successfully.
    pub const EXIT_SUCCESS: i32 = 0;
    /// General/unspecified error.
    pub const EXIT_GENERAL_ERROR: i32 = 1;
    /// The remote API failed or rejected the request.
    pub const EXIT_API_ERROR: i32 = 2;
    /// Requested node or file not found.
    pub const EXIT_NOT_FOUND: i32 = 3;
    /// Invalid configuration.
    pub const EXIT_CONFIG_ERROR: i32 = 5;
    /// Invalid command-line usage (BSD standard).
    pub const EXIT_USAGE_ERROR: i32 = 64;
    /// Input data format error (BSD standard).
    pub const EXIT_DATA_ERROR: i32 = 65;
    /// I/O error (BSD standard).
    pub const EXIT_IO_ERROR: i32 = 74;
    /// Terminated by Ctrl+C (128 + SIGINT).
    pub const EXIT_INTERRUPTED: i32 = 130;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let orphan = ExplorerError::integrity("a > b > c", "a > b");
        assert_eq!(orphan.exit_code(), 65);

        let not_found = ExplorerError::NodeNotFound {
            path: "a > missing".to_string(),
        };
        assert_eq!(not_found.exit_code(), 3);

        let interrupted = ExplorerError::Interrupted;
        assert_eq!(interrupted.exit_code(), 130);
    }

    #[test]
    fn test_integrity_message_names_both_paths() {
        let err = ExplorerError::integrity("root > A > B", "root > A");
        let message = err.to_string();
        assert!(message.contains("root > A > B"));
        assert!(message.contains("'root > A'"));
    }

    #[test]
    fn test_is_retryable() {
        let server = ExplorerError::ApiError {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(server.is_retryable());

        let client = ExplorerError::ApiError {
            status: 400,
            message: "bad query".to_string(),
        };
        assert!(!client.is_retryable());
        assert!(!ExplorerError::Interrupted.is_retryable());
    }
}
