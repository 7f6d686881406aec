//! `billwise draft show | clear`

use billwise_core::review_project_draft;
use billwise_db::DraftStore;

use crate::commands::validate;
use crate::error::ApiResult;

pub fn show<D: DraftStore>(drafts: &D) -> ApiResult<()> {
    println!("{}", describe(drafts)?);
    Ok(())
}

pub fn clear<D: DraftStore>(drafts: &D) -> ApiResult<()> {
    drafts.clear()?;
    println!("🗑️  Pending draft cleared");
    Ok(())
}

/// The pending draft as JSON followed by its validation findings.
pub fn describe<D: DraftStore>(drafts: &D) -> ApiResult<String> {
    let Some(draft) = drafts.load()? else {
        return Ok("No pending draft".to_string());
    };

    let report = review_project_draft(&draft);
    Ok(format!(
        "{}\n\n{}",
        serde_json::to_string_pretty(&draft)?,
        validate::render(&report)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use billwise_core::{ClientDraft, EngagementDraft, ProjectDraft};
    use billwise_db::MemoryDraftStore;

    #[test]
    fn test_describe_empty_store() {
        assert_eq!(describe(&MemoryDraftStore::new()).unwrap(), "No pending draft");
    }

    #[test]
    fn test_describe_includes_findings() {
        let drafts = MemoryDraftStore::new();
        drafts
            .save(&EngagementDraft {
                client: ClientDraft {
                    name: "Acme Corp".into(),
                    email: "not-an-email".into(),
                    ..ClientDraft::default()
                },
                project: ProjectDraft {
                    name: "Portal".into(),
                    ..ProjectDraft::default()
                },
                milestones: Vec::new(),
            })
            .unwrap();

        let output = describe(&drafts).unwrap();
        assert!(output.contains("\"name\": \"Portal\""));
        assert!(output.contains("Invalid Client Email format"));

        clear(&drafts).unwrap();
        assert_eq!(describe(&drafts).unwrap(), "No pending draft");
    }
}
