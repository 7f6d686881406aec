//! `billwise validate <draft.json>`

use std::path::Path;

use billwise_core::validation::Severity;
use billwise_core::{review_project_draft, EngagementDraft, ValidationReport};

use crate::commands::read_json;
use crate::error::{ApiError, ApiResult};

/// Prints every finding; fails when any of them blocks saving.
pub fn run(path: &Path) -> ApiResult<()> {
    let draft: EngagementDraft = read_json(path)?;
    let report = review_project_draft(&draft);

    println!("{}", render(&report));

    if report.is_blocking() {
        let count = report.errors().count();
        return Err(ApiError::validation(format!(
            "{} blocking problem{} found",
            count,
            if count == 1 { "" } else { "s" }
        )));
    }
    Ok(())
}

pub fn render(report: &ValidationReport) -> String {
    if report.is_empty() {
        return "✅ Draft is valid".to_string();
    }

    report
        .issues
        .iter()
        .map(|issue| match issue.severity {
            Severity::Error => format!("❌ {}", issue.message),
            Severity::Warning => format!("⚠️  {}", issue.message),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use billwise_core::validation::ValidationIssue;

    #[test]
    fn test_render_empty_report() {
        assert_eq!(render(&ValidationReport::default()), "✅ Draft is valid");
    }

    #[test]
    fn test_render_marks_severity() {
        let report = ValidationReport {
            issues: vec![
                ValidationIssue::error("Client Name is required"),
                ValidationIssue::warning("Single Invoice strategy should typically have only one milestone/payment event."),
            ],
        };

        let output = render(&report);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("❌"));
        assert!(lines[1].starts_with("⚠️"));
    }

    #[test]
    fn test_blocking_draft_fails() {
        let path = std::env::temp_dir().join(format!("billwise-draft-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{ "client": { "name": "" }, "project": { "name": "Portal" } }"#).unwrap();

        let err = run(&path).unwrap_err();
        assert_eq!(err.message, "1 blocking problem found");

        let _ = std::fs::remove_file(&path);
    }
}
