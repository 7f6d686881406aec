//! # CLI Error Type
//!
//! Unified error type for commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Billwise                               │
//! │                                                                         │
//! │  Command Function: ApiResult<T>                                        │
//! │         │                                                               │
//! │         ├── DbError::QueryFailed("...") ──┐                            │
//! │         │      (logged, generic message)  │                            │
//! │         ├── CoreError::ChoiceRequired ────┼──► ApiError{code, message} │
//! │         ├── ConfigError::Invalid ─────────┤          │                 │
//! │         └── InquireError::Canceled ───────┘          ▼                 │
//! │                                              stderr + exit code        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store failures are never shown raw: the detail goes to the log and the
//! user sees [`SAVE_FAILED`].

use std::process::ExitCode;

use billwise_core::CoreError;
use billwise_db::DbError;
use serde::Serialize;

use crate::config::ConfigError;

/// The one message shown for any record-store failure.
pub const SAVE_FAILED: &str = "Failed to save data. Please check fields and try again.";

/// Error returned from commands.
///
/// ```json
/// { "code": "CHOICE_REQUIRED", "message": "Client already exists: ..." }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,

    /// A draft or value failed validation
    ValidationError,

    /// Record store failure
    DatabaseError,

    /// A duplicate was found and no resolution was given
    ChoiceRequired,

    /// Unreadable input file
    InvalidInput,

    Config,

    /// The user backed out of a prompt
    Cancelled,

    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidInput, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn save_failed() -> Self {
        ApiError::new(ErrorCode::DatabaseError, SAVE_FAILED)
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self.code {
            ErrorCode::ValidationError | ErrorCode::InvalidInput => ExitCode::from(2),
            ErrorCode::ChoiceRequired | ErrorCode::Cancelled => ExitCode::from(3),
            ErrorCode::NotFound => ExitCode::from(4),
            ErrorCode::Config => ExitCode::from(78),
            ErrorCode::DatabaseError | ErrorCode::Internal => ExitCode::FAILURE,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::DraftIo(e) => {
                tracing::error!("Draft storage failed: {}", e);
                ApiError::internal("Could not access the pending draft file")
            }
            DbError::DraftCorrupt(e) => {
                tracing::error!("Pending draft unreadable: {}", e);
                ApiError::invalid_input("The pending draft is unreadable; run `billwise draft clear`")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!("Record store failure: {}", other);
                ApiError::save_failed()
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ChoiceRequired(prompt) => {
                let choices: Vec<&str> = prompt.choices().iter().map(|c| c.as_str()).collect();
                ApiError::new(
                    ErrorCode::ChoiceRequired,
                    format!("{}. Pass --resolution with one of: {}", prompt, choices.join(", ")),
                )
            }
            CoreError::InvalidChoice { .. } => ApiError::validation(err.to_string()),
            CoreError::MalformedExtraction(reason) => {
                ApiError::invalid_input(format!("Unreadable extraction payload: {}", reason))
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::Config, err.to_string())
    }
}

impl From<inquire::InquireError> for ApiError {
    fn from(err: inquire::InquireError) -> Self {
        match err {
            inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted => {
                ApiError::new(ErrorCode::Cancelled, "Cancelled")
            }
            inquire::InquireError::NotTTY => ApiError::new(
                ErrorCode::ChoiceRequired,
                "A decision is required but no terminal is attached; pass --resolution",
            ),
            other => ApiError::internal(format!("Prompt failed: {}", other)),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for commands.
pub type ApiResult<T> = Result<T, ApiError>;
