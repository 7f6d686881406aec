//! # billwise-core: Pure Invoicing Logic for Billwise
//!
//! The invoice arithmetic, draft validation and duplicate reconciliation
//! rules of Billwise, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billwise Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    billwise-cli (commands)                      │   │
//! │  │    totals, validate, extract, import, clients, draft           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ billwise-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────────┐ ┌────────────┐    │   │
//! │  │   │  totals  │ │validation│ │reconciliation│ │ extraction │    │   │
//! │  │   │ subtotal │ │  rules   │ │  duplicates  │ │  defaults  │    │   │
//! │  │   │ tax, disc│ │ messages │ │  resolution  │ │  warnings  │    │   │
//! │  │   └──────────┘ └──────────┘ └──────────────┘ └────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 billwise-db (Persistence Layer)                 │   │
//! │  │        SQLite record store, migrations, draft store             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Line items, drafts, records, engagement enums
//! - [`money`] - Money in integer minor units
//! - [`totals`] - Invoice subtotal / tax / discount / total
//! - [`validation`] - Project draft rules
//! - [`reconciliation`] - Duplicate detection and resolution policy
//! - [`extraction`] - Normalizing document-extraction payloads
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use billwise_core::money::Money;
//! use billwise_core::totals::compute_totals;
//! use billwise_core::types::{LineItem, TaxRate, TaxSettings};
//! use rust_decimal::Decimal;
//!
//! let item = LineItem::new("Consulting", Decimal::ONE, Money::from_minor(59000))
//!     .with_tax_rate(TaxRate::from_bps(1800));
//!
//! // 590.00 tax-inclusive at 18%
//! let totals = compute_totals(&[item], &[], &TaxSettings::inclusive());
//! assert_eq!(totals.rounded().subtotal, Money::from_minor(50000));
//! assert_eq!(totals.rounded().tax_total, Money::from_minor(9000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod extraction;
pub mod money;
pub mod reconciliation;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use extraction::{normalize_extraction, ExtractedDocument, ExtractionDefaults};
pub use money::Money;
pub use reconciliation::{
    find_duplicate_client, find_project_collision, resolve_duplicate_action, versioned_project_name,
    DuplicateAction, DuplicateCheck, ResolutionChoice, ResolutionPrompt,
};
pub use totals::{compute_totals, InvoiceTotals};
pub use types::*;
pub use validation::{review_project_draft, validate_project_draft, ValidationReport};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// How far, in minor units, milestones may add up over the project budget.
///
/// One major unit of slack absorbs rounding from split payments
/// (three equal thirds of 1000.00).
pub const MILESTONE_BUDGET_TOLERANCE: i64 = 100;
