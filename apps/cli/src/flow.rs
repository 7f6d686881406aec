//! # Create-Project Flow
//!
//! Takes a reviewed engagement draft to saved records.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  prepare(draft)                                                         │
//! │     ├── review_project_draft ── blocking errors? ──► ValidationError   │
//! │     └── check_duplicates                                                │
//! │            Unknown client: store search ─► exact filter ─► collision   │
//! │            Known client:   load client  ─► collision                    │
//! │            (search failures fail open: NoDuplicate)                     │
//! │                                                                         │
//! │  resolve(check, choice)                                                 │
//! │     choice, or the one implied by a known client ─► DuplicateAction    │
//! │     no choice for a prompt ──► ChoiceRequired                           │
//! │                                                                         │
//! │  commit(draft, check, action)                                           │
//! │     CreateNew      create client and project (one transaction)          │
//! │     MergeClient    create project under matched client                  │
//! │     UpdateProject  patch matched project (milestones untouched)         │
//! │     CreateVersion  create "<name> (V2)" under matched client            │
//! │     ReplaceProject delete matched project and create (one transaction)  │
//! │     (any store failure ──► SAVE_FAILED, nothing written)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billwise_core::reconciliation::ClientContext;
use billwise_core::{
    find_duplicate_client, find_project_collision, resolve_duplicate_action, review_project_draft,
    versioned_project_name, ClientSummary, DuplicateAction, DuplicateCheck, EngagementDraft, ProjectFull,
    ProjectPatch, ResolutionChoice, ValidationReport,
};
use billwise_db::{DbError, RecordStore};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, ApiResult};

/// A draft that passed validation, with what the duplicate check found.
#[derive(Debug, Clone)]
pub struct PreparedSave {
    /// Non-blocking findings only.
    pub report: ValidationReport,
    pub check: DuplicateCheck,
}

/// What was written.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub action: DuplicateAction,
    pub project: ProjectFull,
}

pub struct ProjectFlow<S> {
    store: S,
    context: ClientContext,
}

impl<S: RecordStore> ProjectFlow<S> {
    pub fn new(store: S) -> Self {
        ProjectFlow {
            store,
            context: ClientContext::Unknown,
        }
    }

    /// Runs the flow for a client that is already chosen.
    pub fn for_client(mut self, client_id: impl Into<String>) -> Self {
        self.context = ClientContext::Known(client_id.into());
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    /// Validates the draft and runs the duplicate check.
    pub async fn prepare(&self, draft: &EngagementDraft) -> ApiResult<PreparedSave> {
        self.prepare_in(&self.context, draft).await
    }

    /// [`prepare`](Self::prepare) under a different client context.
    pub async fn prepare_in(&self, context: &ClientContext, draft: &EngagementDraft) -> ApiResult<PreparedSave> {
        let report = review_project_draft(draft);
        if report.is_blocking() {
            let errors: Vec<&str> = report.errors().map(|issue| issue.message.as_str()).collect();
            return Err(ApiError::validation(errors.join("\n")));
        }

        for issue in report.warnings() {
            warn!(message = %issue.message, "Draft warning");
        }

        let check = self.check_duplicates(context, draft).await?;
        Ok(PreparedSave { report, check })
    }

    /// Looks for an existing client (and project) matching the draft.
    ///
    /// With a known client a failed lookup is an error; otherwise any
    /// store failure counts as "no duplicate".
    async fn check_duplicates(&self, context: &ClientContext, draft: &EngagementDraft) -> ApiResult<DuplicateCheck> {
        match context {
            ClientContext::Known(id) => {
                let full = self.store.get_client_by_id(id).await?;
                let client = ClientSummary::from(&full.client);
                Ok(match find_project_collision(&draft.project.name, &full.projects) {
                    Some(project) => DuplicateCheck::ProjectCollision {
                        client,
                        project: project.clone(),
                    },
                    None => DuplicateCheck::ClientMatch { client },
                })
            }
            ClientContext::Unknown => Ok(self.search_duplicates(draft).await),
        }
    }

    async fn search_duplicates(&self, draft: &EngagementDraft) -> DuplicateCheck {
        let name = draft.client.name.trim();
        let email = draft.client.email.trim();

        let mut client = None;
        for query in [name, email] {
            if query.is_empty() {
                continue;
            }
            let candidates = match self.store.find_clients_by_query(query).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(error = %e, "Duplicate check failed, continuing without it");
                    return DuplicateCheck::NoDuplicate;
                }
            };
            if let Some(found) = find_duplicate_client(name, email, &candidates) {
                client = Some(found.clone());
                break;
            }
        }

        let Some(client) = client else {
            return DuplicateCheck::NoDuplicate;
        };
        debug!(client_id = %client.id, "Existing client matches draft");

        let projects = match self.store.get_client_by_id(&client.id).await {
            Ok(full) => full.projects,
            Err(e) => {
                warn!(error = %e, client_id = %client.id, "Could not load client projects");
                Vec::new()
            }
        };

        match find_project_collision(&draft.project.name, &projects) {
            Some(project) => DuplicateCheck::ProjectCollision {
                client,
                project: project.clone(),
            },
            None => DuplicateCheck::ClientMatch { client },
        }
    }

    /// Turns the check and the user's choice into an action.
    pub fn resolve(&self, check: &DuplicateCheck, choice: Option<ResolutionChoice>) -> ApiResult<DuplicateAction> {
        self.resolve_in(&self.context, check, choice)
    }

    pub fn resolve_in(
        &self,
        context: &ClientContext,
        check: &DuplicateCheck,
        choice: Option<ResolutionChoice>,
    ) -> ApiResult<DuplicateAction> {
        let choice = choice.or_else(|| context.implied_choice(check));
        let action = resolve_duplicate_action(check.has_client_duplicate(), check.has_project_collision(), choice)?;
        Ok(action)
    }

    /// Writes the draft according to `action`.
    pub async fn commit(
        &self,
        draft: &EngagementDraft,
        check: &DuplicateCheck,
        action: DuplicateAction,
    ) -> ApiResult<SaveOutcome> {
        let project = match action {
            DuplicateAction::CreateNew => self
                .store
                .create_client_with_project(&draft.client, &draft.project, &draft.milestones)
                .await
                .map_err(save_failed)?,
            DuplicateAction::MergeClient => {
                let client = matched_client(check)?;
                self.store
                    .create_project(&client.id, &draft.project, &draft.milestones)
                    .await
                    .map_err(save_failed)?
            }
            DuplicateAction::UpdateProject => {
                let project = matched_project(check)?;
                self.store
                    .update_project(&project.id, &ProjectPatch::from(&draft.project))
                    .await
                    .map_err(save_failed)?
            }
            DuplicateAction::CreateVersion => {
                let client = matched_client(check)?;
                let mut project = draft.project.clone();
                project.name = versioned_project_name(&draft.project.name);
                self.store
                    .create_project(&client.id, &project, &draft.milestones)
                    .await
                    .map_err(save_failed)?
            }
            DuplicateAction::ReplaceProject => {
                let client = matched_client(check)?;
                let project = matched_project(check)?;
                self.store
                    .replace_project(&project.id, &client.id, &draft.project, &draft.milestones)
                    .await
                    .map_err(save_failed)?
            }
        };

        info!(
            action = ?action,
            project_id = %project.project.id,
            client_id = %project.project.client_id,
            "Project saved"
        );

        Ok(SaveOutcome { action, project })
    }

    /// Prepare, resolve and commit in one go; for non-interactive callers.
    pub async fn save(&self, draft: &EngagementDraft, choice: Option<ResolutionChoice>) -> ApiResult<SaveOutcome> {
        let prepared = self.prepare(draft).await?;
        let action = self.resolve(&prepared.check, choice)?;
        self.commit(draft, &prepared.check, action).await
    }
}

fn save_failed(err: DbError) -> ApiError {
    error!(error = %err, "Persisting project failed");
    ApiError::save_failed()
}

fn matched_client(check: &DuplicateCheck) -> ApiResult<&ClientSummary> {
    check
        .client()
        .ok_or_else(|| ApiError::internal("resolution needs a matched client"))
}

fn matched_project(check: &DuplicateCheck) -> ApiResult<&billwise_core::ProjectSummary> {
    check
        .project()
        .ok_or_else(|| ApiError::internal("resolution needs a matched project"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, SAVE_FAILED};
    use billwise_core::{
        ClientDraft, ClientFull, MilestoneDraft, Money, ProjectDraft, ProjectType,
    };
    use billwise_db::{Database, DbConfig, DbResult};

    fn engagement(client: &str, project: &str, budget: i64) -> EngagementDraft {
        EngagementDraft {
            client: ClientDraft {
                name: client.into(),
                email: format!("{}@example.com", client.split_whitespace().next().unwrap_or("x").to_lowercase()),
                ..ClientDraft::default()
            },
            project: ProjectDraft {
                name: project.into(),
                project_type: ProjectType::Fixed,
                billing_strategy: ProjectType::Fixed.default_strategy(),
                total_budget: Money::from_minor(budget),
                ..ProjectDraft::default()
            },
            milestones: vec![MilestoneDraft::new("Delivery", Money::from_minor(budget))],
        }
    }

    async fn flow() -> ProjectFlow<Database> {
        ProjectFlow::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    #[tokio::test]
    async fn test_new_client_is_created() {
        let flow = flow().await;

        let outcome = flow.save(&engagement("Acme Corp", "Website", 500000), None).await.unwrap();
        assert_eq!(outcome.action, DuplicateAction::CreateNew);
        assert_eq!(outcome.project.milestones.len(), 1);

        let client = flow.store().get_client_by_id(&outcome.project.project.client_id).await.unwrap();
        assert_eq!(client.client.name, "Acme Corp");
        assert_eq!(client.projects.len(), 1);
    }

    #[tokio::test]
    async fn test_matching_client_needs_a_choice() {
        let flow = flow().await;
        let first = flow.save(&engagement("Acme Corp", "Website", 500000), None).await.unwrap();

        let second = engagement("  acme corp ", "Mobile App", 300000);
        let err = flow.save(&second, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ChoiceRequired);

        let outcome = flow
            .save(&second, Some(ResolutionChoice::AddToClient))
            .await
            .unwrap();
        assert_eq!(outcome.action, DuplicateAction::MergeClient);
        assert_eq!(outcome.project.project.client_id, first.project.project.client_id);

        let client = flow.store().get_client_by_id(&first.project.project.client_id).await.unwrap();
        assert_eq!(client.projects.len(), 2);
    }

    #[tokio::test]
    async fn test_wrong_choice_for_prompt_is_rejected() {
        let flow = flow().await;
        flow.save(&engagement("Acme Corp", "Website", 500000), None).await.unwrap();

        let err = flow
            .save(&engagement("Acme Corp", "Mobile App", 1000), Some(ResolutionChoice::UpdateExisting))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_collision_create_version() {
        let flow = flow().await;
        flow.save(&engagement("Acme Corp", "Website Redesign", 500000), None).await.unwrap();

        let outcome = flow
            .save(&engagement("Acme Corp", "website redesign", 500000), Some(ResolutionChoice::CreateVersion))
            .await
            .unwrap();
        assert_eq!(outcome.action, DuplicateAction::CreateVersion);
        assert_eq!(outcome.project.project.name, "website redesign (V2)");
    }

    #[tokio::test]
    async fn test_collision_update_existing_keeps_milestones() {
        let flow = flow().await;
        let first = flow.save(&engagement("Acme Corp", "Website", 500000), None).await.unwrap();

        let mut update = engagement("Acme Corp", "Website", 800000);
        update.project.description = "Phase two".into();
        update.milestones = vec![MilestoneDraft::new("Other", Money::from_minor(800000))];

        let outcome = flow
            .save(&update, Some(ResolutionChoice::UpdateExisting))
            .await
            .unwrap();
        assert_eq!(outcome.action, DuplicateAction::UpdateProject);
        assert_eq!(outcome.project.project.id, first.project.project.id);
        assert_eq!(outcome.project.project.total_budget, Money::from_minor(800000));
        assert_eq!(outcome.project.project.description, "Phase two");
        assert_eq!(outcome.project.milestones.len(), 1);
        assert_eq!(outcome.project.milestones[0].title, "Delivery");
    }

    #[tokio::test]
    async fn test_collision_delete_and_replace() {
        let flow = flow().await;
        let first = flow.save(&engagement("Acme Corp", "Website", 500000), None).await.unwrap();

        let outcome = flow
            .save(&engagement("Acme Corp", "Website", 600000), Some(ResolutionChoice::DeleteAndReplace))
            .await
            .unwrap();
        assert_eq!(outcome.action, DuplicateAction::ReplaceProject);
        assert_ne!(outcome.project.project.id, first.project.project.id);

        let client = flow.store().get_client_by_id(&first.project.project.client_id).await.unwrap();
        assert_eq!(client.projects.len(), 1);
        assert_eq!(client.projects[0].id, outcome.project.project.id);
    }

    async fn reject_project_inserts(db: &Database) {
        sqlx::query(
            "CREATE TRIGGER reject_projects BEFORE INSERT ON projects BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_old_project() {
        let flow = flow().await;
        let first = flow.save(&engagement("Acme Corp", "Website", 500000), None).await.unwrap();
        reject_project_inserts(flow.store()).await;

        let err = flow
            .save(&engagement("Acme Corp", "Website", 600000), Some(ResolutionChoice::DeleteAndReplace))
            .await
            .unwrap_err();
        assert_eq!(err.message, SAVE_FAILED);

        let client = flow.store().get_client_by_id(&first.project.project.client_id).await.unwrap();
        assert_eq!(client.projects.len(), 1);
        assert_eq!(client.projects[0].id, first.project.project.id);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_no_client() {
        let flow = flow().await;
        reject_project_inserts(flow.store()).await;

        let err = flow.save(&engagement("Acme Corp", "Website", 1000), None).await.unwrap_err();
        assert_eq!(err.message, SAVE_FAILED);
        assert!(flow.store().find_clients_by_query("Acme").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_known_client_implies_add_to_client() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = db
            .clients()
            .insert(&ClientDraft {
                name: "Acme Corp".into(),
                ..ClientDraft::default()
            })
            .await
            .unwrap();

        let flow = ProjectFlow::new(db).for_client(client.id.clone());
        let outcome = flow.save(&engagement("Acme Corp", "Website", 1000), None).await.unwrap();
        assert_eq!(outcome.action, DuplicateAction::MergeClient);
        assert_eq!(outcome.project.project.client_id, client.id);
    }

    #[tokio::test]
    async fn test_similar_names_are_not_duplicates() {
        let flow = flow().await;
        flow.save(&engagement("Johnny Smithson", "Website", 1000), None).await.unwrap();

        let mut draft = engagement("John Smith", "Website", 1000);
        draft.client.email = String::new();
        let prepared = flow.prepare(&draft).await.unwrap();
        assert_eq!(prepared.check, DuplicateCheck::NoDuplicate);
    }

    #[tokio::test]
    async fn test_exact_client_found_among_many_near_misses() {
        let flow = flow().await;
        let clients = flow.store().clients();
        clients
            .insert(&ClientDraft {
                name: "Zeta Corp".into(),
                ..ClientDraft::default()
            })
            .await
            .unwrap();
        for i in 0..25 {
            clients
                .insert(&ClientDraft {
                    name: format!("A{:02} Zeta Corp", i),
                    ..ClientDraft::default()
                })
                .await
                .unwrap();
        }

        let mut draft = engagement("zeta corp", "Website", 1000);
        draft.client.email = String::new();
        let prepared = flow.prepare(&draft).await.unwrap();
        assert_eq!(prepared.check.client().map(|c| c.name.as_str()), Some("Zeta Corp"));
    }

    #[tokio::test]
    async fn test_blocking_errors_stop_the_save() {
        let flow = flow().await;
        let mut draft = engagement("Acme Corp", "Website", 500000);
        draft.milestones = vec![
            MilestoneDraft::new("Part 1", Money::from_minor(250000)),
            MilestoneDraft::new("Part 2", Money::from_minor(260000)),
        ];

        let err = flow.save(&draft, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("exceeds Total Budget"));

        assert!(flow.store().find_clients_by_query("Acme").await.unwrap().is_empty());
    }

    // -------------------------------------------------------------------------
    // Failing store
    // -------------------------------------------------------------------------

    struct FailingStore;

    fn offline<T>() -> DbResult<T> {
        Err(DbError::ConnectionFailed("offline".into()))
    }

    impl RecordStore for FailingStore {
        async fn find_clients_by_query(&self, _text: &str) -> DbResult<Vec<ClientSummary>> {
            offline()
        }

        async fn get_client_by_id(&self, _id: &str) -> DbResult<ClientFull> {
            offline()
        }

        async fn create_client(&self, _draft: &ClientDraft) -> DbResult<ClientFull> {
            offline()
        }

        async fn create_project(
            &self,
            _client_id: &str,
            _project: &ProjectDraft,
            _milestones: &[MilestoneDraft],
        ) -> DbResult<ProjectFull> {
            offline()
        }

        async fn update_project(&self, _id: &str, _patch: &ProjectPatch) -> DbResult<ProjectFull> {
            offline()
        }

        async fn delete_project(&self, _id: &str) -> DbResult<()> {
            offline()
        }
    }

    #[tokio::test]
    async fn test_duplicate_check_fails_open() {
        let flow = ProjectFlow::new(FailingStore);
        let prepared = flow.prepare(&engagement("Acme Corp", "Website", 1000)).await.unwrap();
        assert_eq!(prepared.check, DuplicateCheck::NoDuplicate);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_generic() {
        let flow = ProjectFlow::new(FailingStore);
        let err = flow.save(&engagement("Acme Corp", "Website", 1000), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, SAVE_FAILED);
    }

    #[tokio::test]
    async fn test_known_client_lookup_failure_is_reported() {
        let flow = ProjectFlow::new(FailingStore).for_client("c1");
        let err = flow.prepare(&engagement("Acme Corp", "Website", 1000)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
