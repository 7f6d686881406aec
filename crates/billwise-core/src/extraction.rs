//! # Extraction Normalization
//!
//! Turns the loosely typed JSON returned by the document-extraction service
//! into drafts the rest of the system can trust.
//!
//! ## Flow
//! ```text
//! ┌───────────────────┐     ┌──────────────────────────┐     ┌──────────────────┐
//! │ extraction JSON   │────►│ normalize_extraction()   │────►│ ExtractedDocument│
//! │ (any shape)       │     │  • defaults filled       │     │  client?         │
//! │                   │     │  • enums parsed leniently│     │  projects[]      │
//! │                   │     │  • bad values → warnings │     │  confidence      │
//! └───────────────────┘     └──────────────────────────┘     │  warnings[]      │
//!                                                            └──────────────────┘
//! ```
//!
//! ## Defaults
//! | Field                  | Default                          |
//! |------------------------|----------------------------------|
//! | `billingTrigger`       | `ON_COMPLETION`                  |
//! | milestone `status`     | `PLANNED`                        |
//! | `autoInvoiceEnabled`   | `false`                          |
//! | `autoRemindersEnabled` | `true`                           |
//! | `type`                 | `FIXED`                          |
//! | `billingStrategy`      | derived from `type`              |
//! | `currency`             | [`ExtractionDefaults::currency`] |
//!
//! Only a payload whose top level is not an object is rejected. Everything
//! else is repaired and reported in `warnings`.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    BillingStrategy, BillingTrigger, ClientDraft, EngagementDraft, MilestoneDraft, MilestoneStatus,
    ProjectDraft, ProjectType, DEFAULT_CURRENCY,
};

/// Values filled in when the payload leaves them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionDefaults {
    pub currency: String,
}

impl Default for ExtractionDefaults {
    fn default() -> Self {
        ExtractionDefaults {
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Extractor confidence per section, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Confidence {
    pub overall: Option<f64>,
    pub client: Option<f64>,
    pub projects: Option<f64>,
}

/// A project pulled out of a document, with its milestones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExtractedProject {
    pub project: ProjectDraft,
    pub milestones: Vec<MilestoneDraft>,
}

/// A normalized extraction result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExtractedDocument {
    pub client: Option<ClientDraft>,
    pub projects: Vec<ExtractedProject>,
    pub confidence: Confidence,
    /// Repairs made while normalizing, for the review screen.
    pub warnings: Vec<String>,
}

impl ExtractedDocument {
    /// One engagement draft per extracted project, sharing the client.
    ///
    /// A document with a client and no projects yields a single draft with
    /// an empty project so the client can still be reviewed.
    pub fn engagements(&self) -> Vec<EngagementDraft> {
        let client = self.client.clone().unwrap_or_default();

        if self.projects.is_empty() {
            return match &self.client {
                Some(_) => vec![EngagementDraft {
                    client,
                    ..EngagementDraft::default()
                }],
                None => Vec::new(),
            };
        }

        self.projects
            .iter()
            .map(|extracted| EngagementDraft {
                client: client.clone(),
                project: extracted.project.clone(),
                milestones: extracted.milestones.clone(),
            })
            .collect()
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalizes an extraction payload.
///
/// ## Errors
/// [`CoreError::MalformedExtraction`] when the top level is not a JSON object.
///
/// ## Example
/// ```rust
/// use billwise_core::extraction::{normalize_extraction, ExtractionDefaults};
/// use billwise_core::types::{BillingStrategy, BillingTrigger};
/// use serde_json::json;
///
/// let payload = json!({
///     "client": { "name": "Acme Corp" },
///     "projects": [{
///         "name": "Portal",
///         "type": "milestone",
///         "totalBudget": 500000,
///         "milestones": [{ "title": "Kickoff", "amount": 250000 }]
///     }]
/// });
///
/// let doc = normalize_extraction(&payload, &ExtractionDefaults::default()).unwrap();
/// let project = &doc.projects[0];
/// assert_eq!(project.project.billing_strategy, BillingStrategy::PerMilestone);
/// assert_eq!(project.milestones[0].billing_trigger, BillingTrigger::OnCompletion);
/// ```
pub fn normalize_extraction(payload: &Value, defaults: &ExtractionDefaults) -> CoreResult<ExtractedDocument> {
    let root = payload.as_object().ok_or_else(|| {
        CoreError::MalformedExtraction(format!("expected a JSON object, got {}", kind_of(payload)))
    })?;

    let mut warnings = Vec::new();

    let client = match field(root, &["client"]) {
        None => None,
        Some(Value::Object(obj)) => Some(normalize_client(obj)),
        Some(other) => {
            warnings.push(format!("Ignored client: expected an object, got {}", kind_of(other)));
            None
        }
    };

    let projects = match field(root, &["projects"]) {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match item {
                Value::Object(obj) => Some(normalize_project(obj, index, defaults, &mut warnings)),
                other => {
                    warnings.push(format!(
                        "Ignored project {}: expected an object, got {}",
                        index + 1,
                        kind_of(other)
                    ));
                    None
                }
            })
            .collect(),
        // A single project object instead of a list.
        Some(Value::Object(obj)) => vec![normalize_project(obj, 0, defaults, &mut warnings)],
        Some(other) => {
            warnings.push(format!("Ignored projects: expected a list, got {}", kind_of(other)));
            Vec::new()
        }
    };

    let confidence = normalize_confidence(field(root, &["confidence"]));

    Ok(ExtractedDocument {
        client,
        projects,
        confidence,
        warnings,
    })
}

fn normalize_client(obj: &Map<String, Value>) -> ClientDraft {
    ClientDraft {
        name: text(obj, &["name", "clientName"]).unwrap_or_default(),
        email: text(obj, &["email"]).unwrap_or_default(),
        company: text(obj, &["company", "companyName"]),
        phone: text(obj, &["phone", "phoneNumber"]),
        notes: text(obj, &["notes"]),
    }
}

fn normalize_project(
    obj: &Map<String, Value>,
    index: usize,
    defaults: &ExtractionDefaults,
    warnings: &mut Vec<String>,
) -> ExtractedProject {
    let label = format!("project {}", index + 1);

    let project_type = parse_enum::<ProjectType>(obj, &["type", "projectType"], &label, warnings)
        .unwrap_or_default();

    // A missing or unreadable strategy follows the project type.
    let billing_strategy = parse_enum::<BillingStrategy>(
        obj,
        &["billingStrategy", "billing_strategy"],
        &label,
        warnings,
    )
    .unwrap_or_else(|| project_type.default_strategy());

    let project = ProjectDraft {
        name: text(obj, &["name", "projectName"]).unwrap_or_default(),
        description: text(obj, &["description"]).unwrap_or_default(),
        project_type,
        billing_strategy,
        total_budget: amount(obj, &["totalBudget", "total_budget", "budget"], &label, warnings),
        currency: text(obj, &["currency"])
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| defaults.currency.clone()),
        start_date: date(obj, &["startDate", "start_date"], &label, warnings),
        end_date: date(obj, &["endDate", "end_date"], &label, warnings),
        auto_invoice_enabled: flag(obj, &["autoInvoiceEnabled", "auto_invoice_enabled"]).unwrap_or(false),
        auto_reminders_enabled: flag(obj, &["autoRemindersEnabled", "auto_reminders_enabled"])
            .unwrap_or(true),
    };

    let milestones = match field(obj, &["milestones"]) {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(m_index, item)| match item {
                Value::Object(m) => Some(normalize_milestone(m, &label, m_index, warnings)),
                other => {
                    warnings.push(format!(
                        "Ignored milestone {} of {}: expected an object, got {}",
                        m_index + 1,
                        label,
                        kind_of(other)
                    ));
                    None
                }
            })
            .collect(),
        Some(other) => {
            warnings.push(format!("Ignored milestones of {}: expected a list, got {}", label, kind_of(other)));
            Vec::new()
        }
    };

    ExtractedProject { project, milestones }
}

fn normalize_milestone(
    obj: &Map<String, Value>,
    project_label: &str,
    index: usize,
    warnings: &mut Vec<String>,
) -> MilestoneDraft {
    let label = format!("milestone {} of {}", index + 1, project_label);

    MilestoneDraft {
        title: text(obj, &["title", "name"]).unwrap_or_default(),
        amount: amount(obj, &["amount"], &label, warnings),
        expected_date: date(obj, &["expectedDate", "expected_date"], &label, warnings),
        due_date: date(obj, &["dueDate", "due_date"], &label, warnings),
        billing_trigger: parse_enum::<BillingTrigger>(obj, &["billingTrigger", "billing_trigger"], &label, warnings)
            .unwrap_or_default(),
        status: parse_enum::<MilestoneStatus>(obj, &["status"], &label, warnings).unwrap_or_default(),
    }
}

/// Accepts a bare number (overall) or an object with per-section scores.
fn normalize_confidence(value: Option<&Value>) -> Confidence {
    match value {
        Some(Value::Object(obj)) => Confidence {
            overall: field(obj, &["overall"]).and_then(score),
            client: field(obj, &["client"]).and_then(score),
            projects: field(obj, &["projects", "project"]).and_then(score),
        },
        Some(other) => Confidence {
            overall: score(other),
            ..Confidence::default()
        },
        None => Confidence::default(),
    }
}

// =============================================================================
// Field Readers
// =============================================================================

/// First present, non-null value among `keys`.
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// Trimmed text; numbers are accepted and rendered. Blank is absent.
fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    let raw = match field(obj, keys)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

fn flag(obj: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    match field(obj, keys)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}

/// Minor units. Fractional values are rounded half away from zero.
fn amount(obj: &Map<String, Value>, keys: &[&str], label: &str, warnings: &mut Vec<String>) -> Money {
    let Some(value) = field(obj, keys) else {
        return Money::zero();
    };

    let parsed = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Money::from_minor(i)),
            None => n
                .as_f64()
                .and_then(|f| Decimal::try_from(f).ok())
                .map(Money::from_decimal_rounded),
        },
        Value::String(s) => s
            .trim()
            .replace(',', "")
            .parse::<Decimal>()
            .ok()
            .map(Money::from_decimal_rounded),
        _ => None,
    };

    parsed.unwrap_or_else(|| {
        warnings.push(format!("Unreadable amount {} for {}, using 0", value, label));
        Money::zero()
    })
}

/// `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
fn date(obj: &Map<String, Value>, keys: &[&str], label: &str, warnings: &mut Vec<String>) -> Option<NaiveDate> {
    let raw = text(obj, keys)?;

    let parsed = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(&raw).ok().map(|dt| dt.date_naive()));

    if parsed.is_none() {
        warnings.push(format!("Unreadable date '{}' for {}, left empty", raw, label));
    }
    parsed
}

/// Lenient enum read; an unknown spelling is reported and treated as absent.
fn parse_enum<T>(obj: &Map<String, Value>, keys: &[&str], label: &str, warnings: &mut Vec<String>) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = text(obj, keys)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warnings.push(format!("Unknown {} '{}' for {}, using default", keys[0], raw, label));
            None
        }
    }
}

fn score(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    // Some extractors report percentages.
    let normalized = if raw > 1.0 { raw / 100.0 } else { raw };
    normalized.is_finite().then(|| normalized.clamp(0.0, 1.0))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(payload: Value) -> ExtractedDocument {
        normalize_extraction(&payload, &ExtractionDefaults::default()).unwrap()
    }

    #[test]
    fn test_rejects_non_object() {
        let err = normalize_extraction(&json!([1, 2]), &ExtractionDefaults::default()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedExtraction(_)));
    }

    #[test]
    fn test_empty_object_is_empty_document() {
        let doc = normalize(json!({}));
        assert!(doc.client.is_none());
        assert!(doc.projects.is_empty());
        assert!(doc.warnings.is_empty());
        assert!(doc.engagements().is_empty());
    }

    #[test]
    fn test_defaults_are_applied() {
        let doc = normalize(json!({
            "client": { "name": "  Acme Corp ", "email": "ops@acme.io" },
            "projects": [{
                "name": "Portal",
                "milestones": [{ "title": "Kickoff", "amount": 1000 }]
            }]
        }));

        let client = doc.client.as_ref().unwrap();
        assert_eq!(client.name, "Acme Corp");
        assert!(client.company.is_none());

        let extracted = &doc.projects[0];
        assert_eq!(extracted.project.project_type, ProjectType::Fixed);
        assert_eq!(extracted.project.billing_strategy, BillingStrategy::SingleInvoice);
        assert_eq!(extracted.project.currency, "INR");
        assert!(!extracted.project.auto_invoice_enabled);
        assert!(extracted.project.auto_reminders_enabled);

        let milestone = &extracted.milestones[0];
        assert_eq!(milestone.billing_trigger, BillingTrigger::OnCompletion);
        assert_eq!(milestone.status, MilestoneStatus::Planned);
        assert_eq!(milestone.amount.minor(), 1000);
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_strategy_follows_type() {
        let doc = normalize(json!({
            "projects": [
                { "name": "A", "type": "HOURLY" },
                { "name": "B", "type": "retainer" },
                { "name": "C", "type": "MILESTONE", "billingStrategy": "SINGLE_INVOICE" }
            ]
        }));
        let strategies: Vec<_> = doc.projects.iter().map(|p| p.project.billing_strategy).collect();
        assert_eq!(
            strategies,
            vec![
                BillingStrategy::HourlyTimesheet,
                BillingStrategy::RetainerMonthly,
                BillingStrategy::SingleInvoice
            ]
        );
    }

    #[test]
    fn test_unknown_enum_warns_and_defaults() {
        let doc = normalize(json!({
            "projects": [{
                "name": "A",
                "type": "subscription",
                "milestones": [{ "title": "M", "amount": 5, "status": "late" }]
            }]
        }));
        let extracted = &doc.projects[0];
        assert_eq!(extracted.project.project_type, ProjectType::Fixed);
        assert_eq!(extracted.milestones[0].status, MilestoneStatus::Planned);
        assert_eq!(doc.warnings.len(), 2);
        assert!(doc.warnings[0].contains("subscription"));
    }

    #[test]
    fn test_amount_shapes() {
        let doc = normalize(json!({
            "projects": [{
                "name": "A",
                "totalBudget": "5,000",
                "milestones": [
                    { "title": "float", "amount": 1234.5 },
                    { "title": "bad", "amount": true }
                ]
            }]
        }));
        let extracted = &doc.projects[0];
        assert_eq!(extracted.project.total_budget.minor(), 5000);
        assert_eq!(extracted.milestones[0].amount.minor(), 1235);
        assert_eq!(extracted.milestones[1].amount.minor(), 0);
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn test_dates() {
        let doc = normalize(json!({
            "projects": [{
                "name": "A",
                "startDate": "2026-01-05",
                "endDate": "2026-03-31T10:00:00Z",
                "milestones": [{ "title": "M", "dueDate": "next friday" }]
            }]
        }));
        let extracted = &doc.projects[0];
        assert_eq!(extracted.project.start_date, NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(extracted.project.end_date, NaiveDate::from_ymd_opt(2026, 3, 31));
        assert!(extracted.milestones[0].due_date.is_none());
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn test_currency_default_comes_from_config() {
        let defaults = ExtractionDefaults {
            currency: "USD".to_string(),
        };
        let doc = normalize_extraction(
            &json!({ "projects": [{ "name": "A" }, { "name": "B", "currency": "eur" }] }),
            &defaults,
        )
        .unwrap();
        assert_eq!(doc.projects[0].project.currency, "USD");
        assert_eq!(doc.projects[1].project.currency, "EUR");
    }

    #[test]
    fn test_confidence() {
        let doc = normalize(json!({ "confidence": { "client": 0.92, "projects": "75%" } }));
        assert_eq!(doc.confidence.client, Some(0.92));
        assert_eq!(doc.confidence.projects, Some(0.75));
        assert_eq!(doc.confidence.overall, None);

        let doc = normalize(json!({ "confidence": 0.5 }));
        assert_eq!(doc.confidence.overall, Some(0.5));
    }

    #[test]
    fn test_wrong_shapes_are_skipped_with_warnings() {
        let doc = normalize(json!({
            "client": "Acme",
            "projects": [ "Portal", { "name": "Real", "milestones": {} } ]
        }));
        assert!(doc.client.is_none());
        assert_eq!(doc.projects.len(), 1);
        assert_eq!(doc.projects[0].project.name, "Real");
        assert_eq!(doc.warnings.len(), 3);
    }

    #[test]
    fn test_engagements_share_client() {
        let doc = normalize(json!({
            "client": { "name": "Acme" },
            "projects": [{ "name": "A" }, { "name": "B" }]
        }));
        let drafts = doc.engagements();
        assert_eq!(drafts.len(), 2);
        assert!(drafts.iter().all(|d| d.client.name == "Acme"));

        let client_only = normalize(json!({ "client": { "name": "Acme" } }));
        assert_eq!(client_only.engagements().len(), 1);
    }
}
