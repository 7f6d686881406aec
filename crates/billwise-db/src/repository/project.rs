//! # Project Repository
//!
//! Database operations for projects and their milestones.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert(client, project, milestones)                                    │
//! │     BEGIN                                                               │
//! │       INSERT projects                                                   │
//! │       INSERT milestones (position 0..n)                                 │
//! │     COMMIT              ← all or nothing                                │
//! │                                                                         │
//! │  patch(id, ProjectPatch)                                                │
//! │     UPDATE projects SET description, type, strategy, budget,           │
//! │                         dates, automation flags                         │
//! │     (name, client and milestones untouched)                             │
//! │                                                                         │
//! │  delete(id)                                                             │
//! │     DELETE projects     ← milestones go with it (ON DELETE CASCADE)     │
//! │                                                                         │
//! │  replace(old, client, project, milestones)                              │
//! │     BEGIN  delete(old)  insert(...)  COMMIT                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use billwise_core::{
    MilestoneDraft, MilestoneRecord, ProjectDraft, ProjectFull, ProjectPatch, ProjectRecord, ProjectSummary,
};

const PROJECT_COLUMNS: &str = r#"
    id, client_id, name, description, project_type, billing_strategy,
    total_budget, currency, start_date, end_date,
    auto_invoice_enabled, auto_reminders_enabled, created_at, updated_at
"#;

/// Repository for project database operations.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: SqlitePool,
}

impl ProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProjectRepository { pool }
    }

    /// Inserts a project and its milestones in one transaction.
    ///
    /// ## Returns
    /// * `Ok(ProjectFull)` - the stored project, milestones in input order
    /// * `Err(DbError::ForeignKeyViolation)` - `client_id` does not exist
    pub async fn insert(
        &self,
        client_id: &str,
        draft: &ProjectDraft,
        milestones: &[MilestoneDraft],
    ) -> DbResult<ProjectFull> {
        let mut tx = self.pool.begin().await?;
        let project = Self::insert_with(&mut *tx, client_id, draft, milestones).await?;
        tx.commit().await?;
        Ok(project)
    }

    /// Deletes `old_id` and inserts the new project in one transaction.
    /// When the insert fails the old project is kept.
    pub async fn replace(
        &self,
        old_id: &str,
        client_id: &str,
        draft: &ProjectDraft,
        milestones: &[MilestoneDraft],
    ) -> DbResult<ProjectFull> {
        debug!(old_id = %old_id, client_id = %client_id, "Replacing project");

        let mut tx = self.pool.begin().await?;
        Self::delete_with(&mut *tx, old_id).await?;
        let project = Self::insert_with(&mut *tx, client_id, draft, milestones).await?;
        tx.commit().await?;
        Ok(project)
    }

    /// Project and milestone inserts on a caller-held transaction.
    pub(crate) async fn insert_with(
        conn: &mut SqliteConnection,
        client_id: &str,
        draft: &ProjectDraft,
        milestones: &[MilestoneDraft],
    ) -> DbResult<ProjectFull> {
        let now = Utc::now();
        let project = ProjectRecord {
            id: Uuid::new_v4().to_string(),
            client_id: client_id.to_string(),
            name: draft.name.trim().to_string(),
            description: draft.description.clone(),
            project_type: draft.project_type,
            billing_strategy: draft.billing_strategy,
            total_budget: draft.total_budget,
            currency: draft.currency.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            auto_invoice_enabled: draft.auto_invoice_enabled,
            auto_reminders_enabled: draft.auto_reminders_enabled,
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %project.id,
            client_id = %client_id,
            milestones = milestones.len(),
            "Inserting project"
        );

        sqlx::query(
            r#"
            INSERT INTO projects (
                id, client_id, name, description, project_type, billing_strategy,
                total_budget, currency, start_date, end_date,
                auto_invoice_enabled, auto_reminders_enabled, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&project.id)
        .bind(&project.client_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.project_type)
        .bind(project.billing_strategy)
        .bind(project.total_budget.minor())
        .bind(&project.currency)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.auto_invoice_enabled)
        .bind(project.auto_reminders_enabled)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&mut *conn)
        .await?;

        let mut stored = Vec::with_capacity(milestones.len());
        for (position, milestone) in milestones.iter().enumerate() {
            let record = MilestoneRecord {
                id: Uuid::new_v4().to_string(),
                project_id: project.id.clone(),
                position: i64::try_from(position).unwrap_or(i64::MAX),
                title: milestone.title.trim().to_string(),
                amount: milestone.amount,
                expected_date: milestone.expected_date,
                due_date: milestone.due_date,
                billing_trigger: milestone.billing_trigger,
                status: milestone.status,
            };

            sqlx::query(
                r#"
                INSERT INTO milestones (
                    id, project_id, position, title, amount,
                    expected_date, due_date, billing_trigger, status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&record.id)
            .bind(&record.project_id)
            .bind(record.position)
            .bind(&record.title)
            .bind(record.amount.minor())
            .bind(record.expected_date)
            .bind(record.due_date)
            .bind(record.billing_trigger)
            .bind(record.status)
            .execute(&mut *conn)
            .await?;

            stored.push(record);
        }

        Ok(ProjectFull {
            project,
            milestones: stored,
        })
    }

    /// Gets a project by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ProjectRecord>> {
        let sql = format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS);
        let project: Option<ProjectRecord> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    /// Gets a project with its milestones in position order.
    pub async fn get_full(&self, id: &str) -> DbResult<Option<ProjectFull>> {
        let Some(project) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let milestones = self.milestones(id).await?;
        Ok(Some(ProjectFull { project, milestones }))
    }

    /// Milestones of a project, in position order.
    pub async fn milestones(&self, project_id: &str) -> DbResult<Vec<MilestoneRecord>> {
        let milestones: Vec<MilestoneRecord> = sqlx::query_as(
            r#"
            SELECT id, project_id, position, title, amount,
                   expected_date, due_date, billing_trigger, status
            FROM milestones
            WHERE project_id = ?1
            ORDER BY position
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(milestones)
    }

    /// Names of a client's projects, for the collision check.
    pub async fn list_by_client(&self, client_id: &str) -> DbResult<Vec<ProjectSummary>> {
        let projects: Vec<ProjectSummary> = sqlx::query_as(
            r#"
            SELECT id, name
            FROM projects
            WHERE client_id = ?1
            ORDER BY created_at, name
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    /// Overwrites a project's mutable fields.
    ///
    /// ## Returns
    /// * `Ok(ProjectFull)` - the project after the update
    /// * `Err(DbError::NotFound)` - no project with that id
    pub async fn patch(&self, id: &str, patch: &ProjectPatch) -> DbResult<ProjectFull> {
        debug!(id = %id, "Patching project");

        let result = sqlx::query(
            r#"
            UPDATE projects SET
                description = ?2,
                project_type = ?3,
                billing_strategy = ?4,
                total_budget = ?5,
                start_date = ?6,
                end_date = ?7,
                auto_invoice_enabled = ?8,
                auto_reminders_enabled = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.description)
        .bind(patch.project_type)
        .bind(patch.billing_strategy)
        .bind(patch.total_budget.minor())
        .bind(patch.start_date)
        .bind(patch.end_date)
        .bind(patch.auto_invoice_enabled)
        .bind(patch.auto_reminders_enabled)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Project", id));
        }

        self.get_full(id)
            .await?
            .ok_or_else(|| DbError::not_found("Project", id))
    }

    /// Deletes a project; its milestones are removed by the cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::delete_with(&mut *conn, id).await
    }

    async fn delete_with(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting project");

        let result = sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Project", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use billwise_core::{BillingStrategy, ClientDraft, MilestoneStatus, Money, ProjectType};
    use chrono::NaiveDate;

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = db
            .clients()
            .insert(&ClientDraft {
                name: "Acme".into(),
                ..ClientDraft::default()
            })
            .await
            .unwrap();
        (db, client.id)
    }

    fn project_draft(name: &str) -> ProjectDraft {
        ProjectDraft {
            name: name.to_string(),
            project_type: ProjectType::Milestone,
            billing_strategy: BillingStrategy::PerMilestone,
            total_budget: Money::from_minor(500000),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 5),
            ..ProjectDraft::default()
        }
    }

    #[tokio::test]
    async fn test_insert_with_milestones_round_trips() {
        let (db, client_id) = setup().await;
        let repo = db.projects();

        let milestones = vec![
            MilestoneDraft::new("Design", Money::from_minor(200000)),
            MilestoneDraft::new("Build", Money::from_minor(300000)),
        ];
        let created = repo.insert(&client_id, &project_draft("Portal"), &milestones).await.unwrap();

        let loaded = repo.get_full(&created.project.id).await.unwrap().unwrap();
        assert_eq!(loaded.project.id, created.project.id);
        assert_eq!(loaded.milestones, created.milestones);
        assert_eq!(loaded.project.total_budget.minor(), 500000);
        assert_eq!(loaded.project.project_type, ProjectType::Milestone);
        assert_eq!(loaded.project.start_date, NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(loaded.milestones[1].title, "Build");
        assert_eq!(loaded.milestones[1].position, 1);
        assert_eq!(loaded.milestones[0].status, MilestoneStatus::Planned);
    }

    #[tokio::test]
    async fn test_insert_under_unknown_client_fails_atomically() {
        let (db, _) = setup().await;
        let repo = db.projects();

        let err = repo
            .insert("no-such-client", &project_draft("Orphan"), &[MilestoneDraft::new("M", Money::zero())])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM milestones")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_patch_keeps_name_and_milestones() {
        let (db, client_id) = setup().await;
        let repo = db.projects();
        let created = repo
            .insert(&client_id, &project_draft("Portal"), &[MilestoneDraft::new("Kickoff", Money::from_minor(1000))])
            .await
            .unwrap();

        let patch = ProjectPatch {
            description: "Phase two".into(),
            project_type: ProjectType::Fixed,
            billing_strategy: BillingStrategy::SingleInvoice,
            total_budget: Money::from_minor(750000),
            start_date: None,
            end_date: NaiveDate::from_ymd_opt(2026, 12, 31),
            auto_invoice_enabled: true,
            auto_reminders_enabled: false,
        };
        let patched = repo.patch(&created.project.id, &patch).await.unwrap();

        assert_eq!(patched.project.name, "Portal");
        assert_eq!(patched.project.description, "Phase two");
        assert_eq!(patched.project.total_budget.minor(), 750000);
        assert_eq!(patched.project.billing_strategy, BillingStrategy::SingleInvoice);
        assert!(patched.project.auto_invoice_enabled);
        assert!(patched.project.start_date.is_none());
        assert_eq!(patched.milestones, created.milestones);
    }

    #[tokio::test]
    async fn test_patch_and_delete_missing_project() {
        let (db, _) = setup().await;
        let repo = db.projects();
        let patch = ProjectPatch::from(&project_draft("x"));

        assert!(repo.patch("missing", &patch).await.unwrap_err().is_not_found());
        assert!(repo.delete("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_milestones() {
        let (db, client_id) = setup().await;
        let repo = db.projects();
        let created = repo
            .insert(&client_id, &project_draft("Portal"), &[MilestoneDraft::new("M", Money::from_minor(5))])
            .await
            .unwrap();

        repo.delete(&created.project.id).await.unwrap();

        assert!(repo.get_by_id(&created.project.id).await.unwrap().is_none());
        assert!(repo.milestones(&created.project.id).await.unwrap().is_empty());
        assert!(repo.list_by_client(&client_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_swaps_project() {
        let (db, client_id) = setup().await;
        let repo = db.projects();
        let old = repo.insert(&client_id, &project_draft("Portal"), &[]).await.unwrap();

        let new = repo
            .replace(&old.project.id, &client_id, &project_draft("Portal"), &[MilestoneDraft::new("M", Money::from_minor(5))])
            .await
            .unwrap();

        let projects = repo.list_by_client(&client_id).await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, new.project.id);
        assert_eq!(new.milestones.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_old_project() {
        let (db, client_id) = setup().await;
        let repo = db.projects();
        let old = repo
            .insert(&client_id, &project_draft("Portal"), &[MilestoneDraft::new("Kickoff", Money::from_minor(5))])
            .await
            .unwrap();

        let err = repo
            .replace(&old.project.id, "no-such-client", &project_draft("Portal"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let kept = repo.get_full(&old.project.id).await.unwrap().unwrap();
        assert_eq!(kept.milestones, old.milestones);
    }

    #[tokio::test]
    async fn test_client_full_lists_projects() {
        let (db, client_id) = setup().await;
        db.projects().insert(&client_id, &project_draft("One"), &[]).await.unwrap();
        db.projects().insert(&client_id, &project_draft("Two"), &[]).await.unwrap();

        let full = db.clients().get_full(&client_id).await.unwrap().unwrap();
        let mut names: Vec<_> = full.projects.iter().map(|p| p.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["One", "Two"]);
    }
}
