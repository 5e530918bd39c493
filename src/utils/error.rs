//! Error types and handling
//!
//! Every failure the engine can produce is an [`AppError`]. Callers use
//! [`AppError::is_fatal`] to decide whether a failure aborts the whole run or
//! only the record being processed, and the binary maps each variant to a
//! process exit code with [`AppError::exit_code`].

use thiserror::Error;
use tracing::error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input field (exit 1)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network, TLS or response decoding failure talking to the RPC API (exit 3, 4 on timeout)
    #[error("Remote API unavailable: {message}")]
    RemoteUnavailable { message: String, timed_out: bool },

    /// The API answered with a status other than success or duplicate
    #[error("Remote API error (status {status}): {body}")]
    Application { status: i64, body: String },

    /// A group along a path could not be created
    #[error("Failed to create group '{path}': {body}")]
    GroupCreationFailed { path: String, body: String },

    /// A listing call (groups, hosts) did not succeed (exit 2)
    #[error("Listing '{action}' failed (status {status}): {body}")]
    ListingFailed {
        action: String,
        status: i64,
        body: String,
    },

    /// Configuration error (exit 1)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local file I/O error (exit 1)
    #[error("I/O error: {0}")]
    Io(String),

    /// CSV reading or writing error (exit 1)
    #[error("CSV error: {0}")]
    Csv(String),
}

impl AppError {
    /// Build a transport failure that was not a timeout
    pub fn remote_unavailable(message: impl Into<String>) -> Self {
        AppError::RemoteUnavailable {
            message: message.into(),
            timed_out: false,
        }
    }

    /// Whether this error aborts a bulk run instead of failing a single record
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            AppError::Validation(_)
                | AppError::Application { .. }
                | AppError::GroupCreationFailed { .. }
        )
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::ListingFailed { .. } => 2,
            AppError::RemoteUnavailable { timed_out: true, .. } => 4,
            AppError::RemoteUnavailable { .. } => 3,
            AppError::Validation(_)
            | AppError::Application { .. }
            | AppError::GroupCreationFailed { .. }
            | AppError::Config(_)
            | AppError::Io(_)
            | AppError::Csv(_) => 1,
        }
    }

    /// Log the error at a level matching its severity
    pub fn log(&self) {
        if self.is_fatal() {
            error!(error = %self, exit_code = self.exit_code(), "Run aborted");
        } else {
            error!(error = %self, "Record failed");
        }
    }
}

// Implement From for common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::RemoteUnavailable {
                message: "RPC request timed out".to_string(),
                timed_out: true,
            }
        } else if err.is_connect() {
            AppError::remote_unavailable(format!("Failed to connect to RPC endpoint: {}", err))
        } else {
            AppError::remote_unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::remote_unavailable(format!("Malformed JSON response: {}", err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            AppError::Io(err.to_string())
        } else {
            AppError::Csv(err.to_string())
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

/// Result type alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;
