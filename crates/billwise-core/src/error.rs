//! # Error Types
//!
//! Domain-specific error types for billwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  billwise-core errors (this file)                                      │
//! │  ├── CoreError        - Domain errors (resolution, extraction)         │
//! │  └── ValidationError  - Malformed single values                        │
//! │                                                                         │
//! │  billwise-db errors (separate crate)                                   │
//! │  └── DbError          - Record store failures                          │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ApiError         - What the user sees                             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → terminal               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Draft validation does NOT use these types: `validate_project_draft`
//! collects every problem into a list of messages (see
//! [`crate::validation`]). These errors are for operations that cannot
//! continue at all.

use thiserror::Error;

use crate::reconciliation::{ResolutionChoice, ResolutionPrompt};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The duplicate check found a conflict and no choice was supplied.
    ///
    /// ## User Workflow
    /// ```text
    /// Save project "Website" for "Acme Corp"
    ///      │
    ///      ▼
    /// Existing client "acme corp" + project "website"
    ///      │
    ///      ▼
    /// ChoiceRequired(ProjectCollision)
    ///      │
    ///      ▼
    /// UI shows: Update Existing / Create as Version 2 / Delete Old & Replace
    /// ```
    #[error("A decision is required: {0}")]
    ChoiceRequired(ResolutionPrompt),

    /// The supplied choice does not answer the prompt that was raised.
    #[error("'{choice}' is not a valid answer to: {prompt}")]
    InvalidChoice {
        choice: ResolutionChoice,
        prompt: ResolutionPrompt,
    },

    /// The extraction service returned something that is not a document.
    #[error("Unreadable extraction payload: {0}")]
    MalformedExtraction(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Errors for single malformed values (ids, enum spellings).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
