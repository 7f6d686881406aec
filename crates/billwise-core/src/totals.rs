//! # Invoice Totals
//!
//! Subtotal, tax, discount and grand total for an invoice being composed.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each LineItem                                                      │
//! │     line_base = quantity × unit_price                                   │
//! │        │                                                                │
//! │        ├── inclusive && rate > 0                                        │
//! │        │      item_base = line_base / (1 + rate/100)                    │
//! │        │      item_tax  = line_base − item_base                         │
//! │        │                                                                │
//! │        └── otherwise                                                    │
//! │               item_base = line_base                                     │
//! │               item_tax  = line_base × rate/100                          │
//! │                                                                         │
//! │  subtotal       = Σ item_base                                           │
//! │  tax_total      = Σ item_tax     (grouped per nonzero rate)             │
//! │  discount_total = Σ discounts    (percent of subtotal | fixed)          │
//! │  total          = subtotal + tax_total − discount_total                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything stays in exact `Decimal` minor units until
//! [`InvoiceTotals::rounded`] is called for display, so
//! `subtotal + tax_total - discount_total == total` holds exactly.
//!
//! Negative quantities, prices, discount values and out-of-range rates are
//! not rejected here. They flow through as computed values. Results beyond
//! `Decimal`'s range (about 7.9e28) saturate at `Decimal::MAX`/`MIN`, where
//! the additive identity no longer holds.
//!
//! ```rust
//! use billwise_core::money::Money;
//! use billwise_core::totals::compute_totals;
//! use billwise_core::types::{LineItem, TaxRate, TaxSettings};
//! use rust_decimal::Decimal;
//!
//! let items = vec![
//!     LineItem::new("Design", Decimal::from(2), Money::from_minor(50000))
//!         .with_tax_rate(TaxRate::from_bps(1800)),
//! ];
//! let totals = compute_totals(&items, &[], &TaxSettings::exclusive());
//! assert_eq!(totals.subtotal, Decimal::from(100000));
//! assert_eq!(totals.tax_total, Decimal::from(18000));
//! assert_eq!(totals.total, Decimal::from(118000));
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Adjustment, AdjustmentMode, InvoiceDraft, LineItem, TaxRate, TaxSettings};

/// Tax collected at one rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TaxLine {
    #[ts(type = "number")]
    pub rate: TaxRate,
    /// Exact tax in minor units.
    #[ts(type = "number")]
    pub amount: Decimal,
}

/// Exact invoice totals in minor units.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceTotals {
    #[ts(type = "number")]
    pub subtotal: Decimal,
    #[ts(type = "number")]
    pub tax_total: Decimal,
    #[ts(type = "number")]
    pub discount_total: Decimal,
    #[ts(type = "number")]
    pub total: Decimal,
    /// One entry per distinct nonzero rate, ascending by rate.
    pub tax_breakdown: Vec<TaxLine>,
}

impl InvoiceTotals {
    /// Tax collected at `rate`, if any item used it.
    pub fn tax_for_rate(&self, rate: TaxRate) -> Option<Decimal> {
        self.tax_breakdown
            .iter()
            .find(|line| line.rate == rate)
            .map(|line| line.amount)
    }

    /// Rounds every figure to whole minor units for display.
    ///
    /// Each figure is rounded on its own, so the rounded parts may differ
    /// from the rounded total by a unit. The exact values remain the source
    /// of truth.
    pub fn rounded(&self) -> RoundedTotals {
        RoundedTotals {
            subtotal: Money::from_decimal_rounded(self.subtotal),
            tax_total: Money::from_decimal_rounded(self.tax_total),
            discount_total: Money::from_decimal_rounded(self.discount_total),
            total: Money::from_decimal_rounded(self.total),
            tax_breakdown: self
                .tax_breakdown
                .iter()
                .map(|line| (line.rate, Money::from_decimal_rounded(line.amount)))
                .collect(),
        }
    }
}

/// Totals rounded to whole minor units, for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundedTotals {
    pub subtotal: Money,
    pub tax_total: Money,
    pub discount_total: Money,
    pub total: Money,
    pub tax_breakdown: Vec<(TaxRate, Money)>,
}

/// Splits one line into its pre-tax base and its tax.
///
/// ## Example
/// ```rust
/// use billwise_core::money::Money;
/// use billwise_core::totals::split_line;
/// use billwise_core::types::{LineItem, TaxRate};
/// use rust_decimal::Decimal;
///
/// // 590.00 including 18% tax is 500.00 + 90.00
/// let item = LineItem::new("Audit", Decimal::ONE, Money::from_minor(59000))
///     .with_tax_rate(TaxRate::from_bps(1800));
/// let (base, tax) = split_line(&item, true);
/// assert_eq!(base, Decimal::from(50000));
/// assert_eq!(tax, Decimal::from(9000));
/// ```
pub fn split_line(item: &LineItem, inclusive: bool) -> (Decimal, Decimal) {
    let line_base = item.line_base();

    if inclusive && item.tax_rate.is_positive() {
        // rate > 0 keeps the divisor above 1
        let item_base = line_base / (Decimal::ONE + item.tax_rate.fraction());
        (item_base, line_base - item_base)
    } else {
        (line_base, line_base.saturating_mul(item.tax_rate.fraction()))
    }
}

/// Amount a single discount takes off `subtotal`.
///
/// Percent discounts are always taken from the pre-discount subtotal, so
/// stacking two 10% discounts removes 20%, not 19%.
pub fn discount_amount(adjustment: &Adjustment, subtotal: Decimal) -> Decimal {
    match adjustment.mode {
        AdjustmentMode::Percent => (adjustment.value / Decimal::ONE_HUNDRED).saturating_mul(subtotal),
        AdjustmentMode::Fixed => adjustment.value,
    }
}

/// Computes invoice totals. Pure: no I/O, no rounding.
///
/// Only `discount` adjustments enter the result; `fee` adjustments are
/// carried on the invoice but not added to the total.
pub fn compute_totals(
    items: &[LineItem],
    adjustments: &[Adjustment],
    tax_settings: &TaxSettings,
) -> InvoiceTotals {
    let mut subtotal = Decimal::ZERO;
    let mut tax_total = Decimal::ZERO;
    let mut by_rate: BTreeMap<TaxRate, Decimal> = BTreeMap::new();

    for item in items {
        let (item_base, item_tax) = split_line(item, tax_settings.inclusive);
        subtotal = subtotal.saturating_add(item_base);
        tax_total = tax_total.saturating_add(item_tax);

        if !item.tax_rate.is_zero() {
            let rate_tax = by_rate.entry(item.tax_rate).or_insert(Decimal::ZERO);
            *rate_tax = rate_tax.saturating_add(item_tax);
        }
    }

    let discount_total = adjustments
        .iter()
        .filter(|adj| adj.is_discount())
        .map(|adj| discount_amount(adj, subtotal))
        .fold(Decimal::ZERO, Decimal::saturating_add);

    InvoiceTotals {
        subtotal,
        tax_total,
        discount_total,
        total: subtotal.saturating_add(tax_total).saturating_sub(discount_total),
        tax_breakdown: by_rate
            .into_iter()
            .map(|(rate, amount)| TaxLine { rate, amount })
            .collect(),
    }
}

impl InvoiceDraft {
    /// Totals for this invoice.
    pub fn totals(&self) -> InvoiceTotals {
        compute_totals(&self.items, &self.adjustments, &self.tax_settings)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
