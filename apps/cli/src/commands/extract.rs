//! `billwise extract <payload.json>`
//!
//! Also home to [`engagements_from`], which `import` uses to accept either
//! an extraction payload or a ready engagement draft.

use std::path::Path;

use billwise_core::{normalize_extraction, EngagementDraft, ExtractedDocument};
use serde_json::Value;
use tracing::warn;

use crate::commands::read_value;
use crate::config::AppConfig;
use crate::error::ApiResult;

pub fn run(config: &AppConfig, path: &Path) -> ApiResult<()> {
    let document = normalize(&read_value(path)?, config)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// Normalizes a payload, logging every repair made along the way.
pub fn normalize(payload: &Value, config: &AppConfig) -> ApiResult<ExtractedDocument> {
    let document = normalize_extraction(payload, &config.extraction_defaults())?;
    for warning in &document.warnings {
        warn!(%warning, "Extraction payload repaired");
    }
    Ok(document)
}

/// A draft file has a singular `project` object; anything else is treated
/// as an extraction payload.
pub fn is_engagement_draft(value: &Value) -> bool {
    value.get("project").is_some_and(Value::is_object)
}

/// One engagement per project found in `value`.
pub fn engagements_from(value: Value, config: &AppConfig) -> ApiResult<Vec<EngagementDraft>> {
    if is_engagement_draft(&value) {
        return Ok(vec![serde_json::from_value(value)?]);
    }
    Ok(normalize(&value, config)?.engagements())
}
