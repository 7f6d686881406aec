//! # Validation Module
//!
//! Business-rule validation of an engagement draft before it is saved.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                       │
//! │  ├── Shape and enum spellings                                          │
//! │  └── Missing fields fall back to draft defaults                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Every rule runs, every problem is collected                       │
//! │  └── Errors block saving, warnings are advisory                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rules never short-circuit and never fail. Adding a rule means appending
//! a function to [`RULES`].
//!
//! ## Usage
//! ```rust
//! use billwise_core::types::EngagementDraft;
//! use billwise_core::validation::validate_project_draft;
//!
//! let draft = EngagementDraft::default();
//! let messages = validate_project_draft(&draft);
//! assert!(messages.contains(&"Client Name is required".to_string()));
//! assert!(messages.contains(&"Project Name is required".to_string()));
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::MINOR_PER_MAJOR;
use crate::types::{BillingStrategy, EngagementDraft, ProjectType, DEFAULT_CURRENCY};
use crate::MILESTONE_BUDGET_TOLERANCE;

/// Result type for single-value checks.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const CLIENT_NAME_REQUIRED: &str = "Client Name is required";
pub const PROJECT_NAME_REQUIRED: &str = "Project Name is required";
pub const NEGATIVE_BUDGET: &str = "Total Budget cannot be negative";
pub const SINGLE_INVOICE_MANY_MILESTONES: &str =
    "Single Invoice strategy should typically have only one milestone/payment event.";
pub const PER_MILESTONE_NEEDS_MILESTONE: &str =
    "At least one milestone is required for 'Per Milestone' billing.";
pub const START_AFTER_END: &str = "Project Start Date must be before End Date";
pub const INVALID_CLIENT_EMAIL: &str = "Invalid Client Email format";

/// `local@domain.tld`, no whitespace anywhere.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("hardcoded regex should be valid")
});

// =============================================================================
// Report
// =============================================================================

/// How a problem affects saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Severity {
    /// Saving is blocked.
    Error,
    /// Shown to the user; saving may proceed.
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        ValidationIssue {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        ValidationIssue {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Every problem found in a draft, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// True when at least one issue must be fixed before saving.
    pub fn is_blocking(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// All messages, errors and warnings alike.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.message.clone()).collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

// =============================================================================
// Draft Validation
// =============================================================================

/// One independent check over a draft.
pub type Rule = fn(&EngagementDraft) -> Option<ValidationIssue>;

/// Every rule, in the order its message is reported.
pub const RULES: &[Rule] = &[
    client_name_present,
    project_name_present,
    budget_not_negative,
    milestones_within_budget,
    single_invoice_has_one_milestone,
    per_milestone_has_milestones,
    dates_ordered,
    client_email_well_formed,
];

/// Runs every rule and collects the problems with their severity.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Review step: user presses "Save"                                       │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  review_project_draft(draft) ← THIS FUNCTION                           │
/// │       │                                                                 │
/// │       ├── is_blocking()? → show list, stay on review step              │
/// │       │                                                                 │
/// │       └── otherwise     → show warnings, continue to duplicate check   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn review_project_draft(draft: &EngagementDraft) -> ValidationReport {
    ValidationReport {
        issues: RULES.iter().filter_map(|rule| rule(draft)).collect(),
    }
}

/// Validates a draft and returns every message; empty means valid.
///
/// Warnings are included. Use [`review_project_draft`] to tell them apart.
pub fn validate_project_draft(draft: &EngagementDraft) -> Vec<String> {
    review_project_draft(draft).messages()
}

fn client_name_present(draft: &EngagementDraft) -> Option<ValidationIssue> {
    draft
        .client
        .name
        .trim()
        .is_empty()
        .then(|| ValidationIssue::error(CLIENT_NAME_REQUIRED))
}

fn project_name_present(draft: &EngagementDraft) -> Option<ValidationIssue> {
    draft
        .project
        .name
        .trim()
        .is_empty()
        .then(|| ValidationIssue::error(PROJECT_NAME_REQUIRED))
}

fn budget_not_negative(draft: &EngagementDraft) -> Option<ValidationIssue> {
    draft
        .project
        .total_budget
        .is_negative()
        .then(|| ValidationIssue::error(NEGATIVE_BUDGET))
}

/// Milestones may add up to at most one major unit over budget. Less than
/// budget is fine.
fn milestones_within_budget(draft: &EngagementDraft) -> Option<ValidationIssue> {
    let project = &draft.project;
    let applies = matches!(project.project_type, ProjectType::Fixed | ProjectType::Milestone)
        || project.billing_strategy == BillingStrategy::PerMilestone;
    if !applies {
        return None;
    }

    // i128 so many large milestones cannot overflow
    let sum: i128 = draft.milestones.iter().map(|m| i128::from(m.amount.minor())).sum();
    let budget = i128::from(project.total_budget.minor());

    if sum <= budget + i128::from(MILESTONE_BUDGET_TOLERANCE) {
        return None;
    }

    let currency = if project.currency.trim().is_empty() {
        DEFAULT_CURRENCY
    } else {
        project.currency.trim()
    };

    Some(ValidationIssue::error(format!(
        "Sum of milestones ({}) exceeds Total Budget ({}) by {}",
        format_amount(currency, sum),
        format_amount(currency, budget),
        format_amount(currency, sum - budget),
    )))
}

fn single_invoice_has_one_milestone(draft: &EngagementDraft) -> Option<ValidationIssue> {
    (draft.project.billing_strategy == BillingStrategy::SingleInvoice && draft.milestones.len() > 1)
        .then(|| ValidationIssue::warning(SINGLE_INVOICE_MANY_MILESTONES))
}

fn per_milestone_has_milestones(draft: &EngagementDraft) -> Option<ValidationIssue> {
    (draft.project.billing_strategy == BillingStrategy::PerMilestone && draft.milestones.is_empty())
        .then(|| ValidationIssue::error(PER_MILESTONE_NEEDS_MILESTONE))
}

fn dates_ordered(draft: &EngagementDraft) -> Option<ValidationIssue> {
    match (draft.project.start_date, draft.project.end_date) {
        (Some(start), Some(end)) if start > end => Some(ValidationIssue::error(START_AFTER_END)),
        _ => None,
    }
}

fn client_email_well_formed(draft: &EngagementDraft) -> Option<ValidationIssue> {
    let email = draft.client.email.trim();
    (!email.is_empty() && !is_valid_email(email)).then(|| ValidationIssue::error(INVALID_CLIENT_EMAIL))
}

/// `amount/100` with two decimals behind an ISO code, e.g. `INR 5100.00`.
fn format_amount(currency: &str, minor: i128) -> String {
    let per_major = i128::from(MINOR_PER_MAJOR);
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.abs();
    format!("{} {}{}.{:02}", currency, sign, abs / per_major, abs % per_major)
}

// =============================================================================
// Single-Value Validators
// =============================================================================

/// Checks the `local@domain.tld` shape.
///
/// ```rust
/// use billwise_core::validation::is_valid_email;
///
/// assert!(is_valid_email("ops@acme.io"));
/// assert!(!is_valid_email("ops@acme"));
/// assert!(!is_valid_email("ops @acme.io"));
/// ```
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Validates a record id (UUID).
///
/// ## Example
/// ```rust
/// use billwise_core::validation::validate_record_id;
///
/// assert!(validate_record_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_record_id("not-a-uuid").is_err());
/// ```
pub fn validate_record_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
