//! # Domain Types
//!
//! Core domain types used throughout Billwise.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Invoice side (ephemeral, edited in the browser)                        │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │   Adjustment    │   │  TaxSettings    │       │
//! │  │  quantity       │   │  discount | fee │   │  inclusive      │       │
//! │  │  unit_price     │   │  percent|fixed  │   │  automatic      │       │
//! │  │  tax_rate       │   │  value          │   │  default_rate   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Engagement side (drafts → records)                                     │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ClientDraft    │   │  ProjectDraft   │   │ MilestoneDraft  │       │
//! │  │  name, email    │──►│  type, strategy │──►│  amount         │       │
//! │  │                 │1 n│  total_budget   │1 n│  trigger        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │         │ persist              │ persist             │ persist          │
//! │         ▼                      ▼                     ▼                  │
//! │    ClientRecord           ProjectRecord        MilestoneRecord          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%, so 1800 bps = 18% (GST) and 825 bps = 8.25%.
/// An integer key keeps the per-rate breakdown exact: `18` and `18.00`
/// from the web client land on the same rate.
///
/// On the wire a rate is a plain percentage number (`"taxRate": 18`).
/// Values outside 0-100% are carried as-is; range checks belong to the
/// validator, not the arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct TaxRate(i64);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage, rounded to the nearest basis point.
    /// Percentages beyond the `i64` basis-point range saturate.
    pub fn from_percentage(pct: Decimal) -> Self {
        let saturated = TaxRate(if pct.is_sign_negative() { i64::MIN } else { i64::MAX });
        match pct.checked_mul(Decimal::ONE_HUNDRED) {
            Some(bps) => bps.round().to_i64().map_or(saturated, TaxRate),
            None => saturated,
        }
    }

    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    /// Returns the rate as an exact percentage (1800 bps → 18).
    pub fn percentage(&self) -> Decimal {
        Decimal::new(self.0, 2).normalize()
    }

    /// Returns the rate as a fraction (1800 bps → 0.18).
    pub fn fraction(&self) -> Decimal {
        Decimal::new(self.0, 4)
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl From<Decimal> for TaxRate {
    fn from(pct: Decimal) -> Self {
        TaxRate::from_percentage(pct)
    }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Self {
        rate.percentage()
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

// =============================================================================
// Invoice Composition
// =============================================================================

/// One billable line on an invoice.
///
/// Line items have no identity until the invoice is saved; the invoice
/// draft owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Quantity; fractional for hourly work (1.5 hours).
    #[ts(type = "number")]
    pub quantity: Decimal,

    /// Unit price in minor units. Tax-inclusive when
    /// [`TaxSettings::inclusive`] is set.
    pub unit_price: Money,

    /// Tax rate applied to this line.
    #[serde(default)]
    #[ts(type = "number")]
    pub tax_rate: TaxRate,
}

impl LineItem {
    /// Creates a line item with zero tax.
    pub fn new(title: impl Into<String>, quantity: Decimal, unit_price: Money) -> Self {
        LineItem {
            title: title.into(),
            description: None,
            quantity,
            unit_price,
            tax_rate: TaxRate::zero(),
        }
    }

    /// Sets the tax rate.
    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rate = rate;
        self
    }

    /// `quantity * unit_price`, exact unless it leaves `Decimal`'s range,
    /// where it saturates.
    pub fn line_base(&self) -> Decimal {
        self.quantity.saturating_mul(self.unit_price.to_decimal())
    }
}

/// Whether an adjustment lowers or raises the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AdjustmentKind {
    Discount,
    Fee,
}

/// How an adjustment's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AdjustmentMode {
    /// `value` is a percentage of the pre-discount subtotal.
    Percent,
    /// `value` is an absolute amount in minor units.
    Fixed,
}

/// A discount or fee attached to an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Adjustment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    pub mode: AdjustmentMode,
    #[ts(type = "number")]
    pub value: Decimal,
}

impl Adjustment {
    /// A discount adjustment.
    pub fn discount(name: impl Into<String>, mode: AdjustmentMode, value: Decimal) -> Self {
        let name = name.into();
        Adjustment {
            id: format!("discount-{}", name.to_lowercase().replace(' ', "-")),
            name,
            kind: AdjustmentKind::Discount,
            mode,
            value,
        }
    }

    pub fn is_discount(&self) -> bool {
        self.kind == AdjustmentKind::Discount
    }
}

/// Invoice-level tax settings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TaxSettings {
    /// Unit prices already contain tax; tax is extracted, not added.
    #[serde(default)]
    pub inclusive: bool,

    /// New line items pick up `default_rate` automatically.
    #[serde(default)]
    pub automatic: bool,

    #[serde(default)]
    #[ts(type = "number | null")]
    pub default_rate: Option<TaxRate>,
}

impl TaxSettings {
    /// Exclusive tax (price + tax shown separately).
    pub const fn exclusive() -> Self {
        TaxSettings {
            inclusive: false,
            automatic: false,
            default_rate: None,
        }
    }

    /// Inclusive tax (price contains tax).
    pub const fn inclusive() -> Self {
        TaxSettings {
            inclusive: true,
            automatic: false,
            default_rate: None,
        }
    }

    /// The rate a freshly added line item should start with.
    pub fn rate_for_new_item(&self) -> TaxRate {
        match (self.automatic, self.default_rate) {
            (true, Some(rate)) => rate,
            _ => TaxRate::zero(),
        }
    }
}

/// An invoice being composed: the input of the totals engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceDraft {
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub items: Vec<LineItem>,

    #[serde(default)]
    pub adjustments: Vec<Adjustment>,

    #[serde(default)]
    pub tax_settings: TaxSettings,
}

impl Default for InvoiceDraft {
    fn default() -> Self {
        InvoiceDraft {
            currency: default_currency(),
            items: Vec::new(),
            adjustments: Vec::new(),
            tax_settings: TaxSettings::default(),
        }
    }
}

impl InvoiceDraft {
    /// Appends an item, applying the automatic default rate when enabled.
    pub fn add_item(&mut self, title: impl Into<String>, quantity: Decimal, unit_price: Money) {
        let rate = self.tax_settings.rate_for_new_item();
        self.items
            .push(LineItem::new(title, quantity, unit_price).with_tax_rate(rate));
    }
}

/// Currency used when a draft does not name one.
pub const DEFAULT_CURRENCY: &str = "INR";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

// =============================================================================
// Engagement Enums
// =============================================================================

/// Generates `Display` and lenient `FromStr` for the SCREAMING_SNAKE_CASE
/// engagement enums. Parsing ignores case and accepts spaces or hyphens
/// in place of underscores, the way extraction payloads spell them.
macro_rules! wire_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// The wire spelling of this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
                match normalized.as_str() {
                    $($wire => Ok($ty::$variant),)+
                    _ => Err(ValidationError::NotAllowed {
                        field: $field.to_string(),
                        allowed: $ty::ALL.iter().map(|v| v.as_str().to_string()).collect(),
                    }),
                }
            }
        }
    };
}

/// How a project is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ProjectType {
    #[default]
    Fixed,
    Milestone,
    Hourly,
    Retainer,
}

wire_enum!(ProjectType, "type", {
    Fixed => "FIXED",
    Milestone => "MILESTONE",
    Hourly => "HOURLY",
    Retainer => "RETAINER",
});

impl ProjectType {
    /// The billing strategy a project of this type starts with.
    pub const fn default_strategy(&self) -> BillingStrategy {
        match self {
            ProjectType::Fixed => BillingStrategy::SingleInvoice,
            ProjectType::Milestone => BillingStrategy::PerMilestone,
            ProjectType::Hourly => BillingStrategy::HourlyTimesheet,
            ProjectType::Retainer => BillingStrategy::RetainerMonthly,
        }
    }
}

/// How a project turns into invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum BillingStrategy {
    PerMilestone,
    #[default]
    SingleInvoice,
    RetainerMonthly,
    HourlyTimesheet,
}

wire_enum!(BillingStrategy, "billingStrategy", {
    PerMilestone => "PER_MILESTONE",
    SingleInvoice => "SINGLE_INVOICE",
    RetainerMonthly => "RETAINER_MONTHLY",
    HourlyTimesheet => "HOURLY_TIMESHEET",
});

/// What makes a milestone invoiceable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum BillingTrigger {
    #[default]
    OnCompletion,
    OnDate,
    OnApproval,
    Manual,
}

wire_enum!(BillingTrigger, "billingTrigger", {
    OnCompletion => "ON_COMPLETION",
    OnDate => "ON_DATE",
    OnApproval => "ON_APPROVAL",
    Manual => "MANUAL",
});

/// Lifecycle of a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum MilestoneStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Invoiced,
    Paid,
}

wire_enum!(MilestoneStatus, "status", {
    Planned => "PLANNED",
    InProgress => "IN_PROGRESS",
    Completed => "COMPLETED",
    Invoiced => "INVOICED",
    Paid => "PAID",
});

// =============================================================================
// Drafts
// =============================================================================

/// A client as entered in a form or pulled out of a document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// A project that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub billing_strategy: BillingStrategy,
    /// Budget in minor units.
    pub total_budget: Money,
    pub currency: String,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub auto_invoice_enabled: bool,
    pub auto_reminders_enabled: bool,
}

impl Default for ProjectDraft {
    fn default() -> Self {
        ProjectDraft {
            name: String::new(),
            description: String::new(),
            project_type: ProjectType::default(),
            billing_strategy: BillingStrategy::default(),
            total_budget: Money::zero(),
            currency: default_currency(),
            start_date: None,
            end_date: None,
            auto_invoice_enabled: false,
            auto_reminders_enabled: true,
        }
    }
}

/// A payment event inside a project draft.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct MilestoneDraft {
    pub title: String,
    /// Amount in minor units.
    pub amount: Money,
    #[ts(as = "Option<String>")]
    pub expected_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub billing_trigger: BillingTrigger,
    pub status: MilestoneStatus,
}

impl MilestoneDraft {
    /// A planned milestone, billed on completion.
    pub fn new(title: impl Into<String>, amount: Money) -> Self {
        MilestoneDraft {
            title: title.into(),
            amount,
            ..MilestoneDraft::default()
        }
    }
}

/// Client, project and milestones reviewed and saved together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct EngagementDraft {
    pub client: ClientDraft,
    pub project: ProjectDraft,
    pub milestones: Vec<MilestoneDraft>,
}

// =============================================================================
// Records
// =============================================================================

/// A saved client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// The slice of a client the duplicate search works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClientSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
}

impl From<&ClientRecord> for ClientSummary {
    fn from(client: &ClientRecord) -> Self {
        ClientSummary {
            id: client.id.clone(),
            name: client.name.clone(),
            email: client.email.clone(),
            company: client.company.clone(),
        }
    }
}

/// A client together with its projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClientFull {
    pub client: ClientRecord,
    pub projects: Vec<ProjectSummary>,
}

/// A saved project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProjectRecord {
    pub id: String,
    pub client_id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub billing_strategy: BillingStrategy,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "i64"))]
    pub total_budget: Money,
    pub currency: String,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub auto_invoice_enabled: bool,
    pub auto_reminders_enabled: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// The slice of a project the name-collision check works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
}

impl From<&ProjectRecord> for ProjectSummary {
    fn from(project: &ProjectRecord) -> Self {
        ProjectSummary {
            id: project.id.clone(),
            name: project.name.clone(),
        }
    }
}

/// A saved milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MilestoneRecord {
    pub id: String,
    pub project_id: String,
    pub position: i64,
    pub title: String,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "i64"))]
    pub amount: Money,
    #[ts(as = "Option<String>")]
    pub expected_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub billing_trigger: BillingTrigger,
    pub status: MilestoneStatus,
}

/// A project together with its milestones, in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProjectFull {
    pub project: ProjectRecord,
    pub milestones: Vec<MilestoneRecord>,
}

/// The mutable fields "Update Existing" overwrites. Name, client and
/// milestones are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProjectPatch {
    pub description: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub billing_strategy: BillingStrategy,
    pub total_budget: Money,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub auto_invoice_enabled: bool,
    pub auto_reminders_enabled: bool,
}

impl From<&ProjectDraft> for ProjectPatch {
    fn from(draft: &ProjectDraft) -> Self {
        ProjectPatch {
            description: draft.description.clone(),
            project_type: draft.project_type,
            billing_strategy: draft.billing_strategy,
            total_budget: draft.total_budget,
            start_date: draft.start_date,
            end_date: draft.end_date,
            auto_invoice_enabled: draft.auto_invoice_enabled,
            auto_reminders_enabled: draft.auto_reminders_enabled,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
