//! `billwise totals <invoice.json>`
//!
//! Fields the file leaves out come from the `[invoice]` config section:
//! currency, tax settings, and (with automatic tax) each item's rate.

use std::path::Path;

use billwise_core::totals::split_line;
use billwise_core::{InvoiceDraft, InvoiceTotals, Money, TaxSettings};
use comfy_table::{Attribute, Cell, Table};
use serde_json::{json, Value};

use crate::commands::read_value;
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};

pub fn run(config: &AppConfig, path: &Path, as_json: bool) -> ApiResult<()> {
    let invoice = load_invoice(read_value(path)?, config)?;
    let totals = invoice.totals();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&totals.rounded())?);
    } else {
        println!("{}", render(&invoice, &totals));
    }
    Ok(())
}

/// Builds the invoice, filling gaps from config.
pub fn load_invoice(mut value: Value, config: &AppConfig) -> ApiResult<InvoiceDraft> {
    let root = value
        .as_object_mut()
        .ok_or_else(|| ApiError::invalid_input("An invoice must be a JSON object"))?;

    root.entry("currency")
        .or_insert_with(|| Value::String(config.invoice.currency.clone()));

    let settings: TaxSettings = match root.get("taxSettings") {
        Some(raw) => serde_json::from_value(raw.clone())?,
        None => {
            let settings = config.tax_settings();
            root.insert("taxSettings".to_string(), serde_json::to_value(settings)?);
            settings
        }
    };

    let rate = settings.rate_for_new_item();
    if !rate.is_zero() {
        if let Some(Value::Array(items)) = root.get_mut("items") {
            for item in items.iter_mut().filter_map(Value::as_object_mut) {
                item.entry("taxRate").or_insert_with(|| json!(rate.percentage()));
            }
        }
    }

    Ok(serde_json::from_value(value)?)
}

/// Line table followed by the summary table.
pub fn render(invoice: &InvoiceDraft, totals: &InvoiceTotals) -> String {
    let currency = invoice.currency.as_str();
    let inclusive = invoice.tax_settings.inclusive;

    let mut lines = Table::new();
    lines.set_header(vec![
        Cell::new("Item"),
        Cell::new("Qty"),
        Cell::new(if inclusive { "Unit Price (incl. tax)" } else { "Unit Price" }),
        Cell::new("Tax Rate"),
        Cell::new("Base"),
        Cell::new("Tax"),
    ]);

    for item in &invoice.items {
        let (base, tax) = split_line(item, inclusive);
        lines.add_row(vec![
            Cell::new(&item.title),
            Cell::new(item.quantity.normalize()),
            Cell::new(item.unit_price.with_currency(currency)),
            Cell::new(item.tax_rate),
            Cell::new(Money::from_decimal_rounded(base).with_currency(currency)),
            Cell::new(Money::from_decimal_rounded(tax).with_currency(currency)),
        ]);
    }

    let rounded = totals.rounded();
    let mut summary = Table::new();
    summary.set_header(vec![Cell::new(""), Cell::new("Amount")]);
    summary.add_row(vec![Cell::new("Subtotal"), Cell::new(rounded.subtotal.with_currency(currency))]);
    for (rate, amount) in &rounded.tax_breakdown {
        summary.add_row(vec![
            Cell::new(format!("Tax @ {}", rate)),
            Cell::new(amount.with_currency(currency)),
        ]);
    }
    summary.add_row(vec![Cell::new("Tax Total"), Cell::new(rounded.tax_total.with_currency(currency))]);
    if !rounded.discount_total.is_zero() {
        summary.add_row(vec![
            Cell::new("Discounts"),
            Cell::new((-rounded.discount_total).with_currency(currency)),
        ]);
    }
    summary.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(rounded.total.with_currency(currency)).add_attribute(Attribute::Bold),
    ]);

    format!("{lines}\n{summary}")
}
