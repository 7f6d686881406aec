//! # Record Store Port
//!
//! The six record operations the create-project flow needs, as a trait so
//! the flow can run against SQLite or a test double.
//!
//! ```text
//! ProjectFlow<S: RecordStore>
//!        │
//!        ├── find_clients_by_query       ─┐
//!        ├── get_client_by_id             │
//!        ├── create_client                │
//!        ├── create_project               ├──► impl RecordStore for Database
//!        ├── update_project               │      (ClientRepository + ProjectRepository)
//!        ├── delete_project               │
//!        ├── create_client_with_project   │  default: create_client, create_project
//!        └── replace_project             ─┘  default: delete_project, create_project
//! ```
//!
//! The flow writes through the two compound operations. `Database` runs each
//! in one transaction, so a failure never leaves a client without its project
//! or a deleted project without its replacement. The defaults make two calls.

use std::future::Future;

use billwise_core::{ClientDraft, ClientFull, ClientSummary, MilestoneDraft, ProjectDraft, ProjectFull, ProjectPatch};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::client::ClientRepository;
use crate::repository::project::ProjectRepository;

/// How many candidates the narrowing search returns.
pub const CLIENT_SEARCH_LIMIT: u32 = 20;

/// Persistence operations on clients and projects.
pub trait RecordStore: Send + Sync {
    /// Broad search over name and email. May return near misses.
    fn find_clients_by_query(&self, text: &str) -> impl Future<Output = DbResult<Vec<ClientSummary>>> + Send;

    /// A client and its projects; `NotFound` when the id is unknown.
    fn get_client_by_id(&self, id: &str) -> impl Future<Output = DbResult<ClientFull>> + Send;

    fn create_client(&self, draft: &ClientDraft) -> impl Future<Output = DbResult<ClientFull>> + Send;

    fn create_project(
        &self,
        client_id: &str,
        project: &ProjectDraft,
        milestones: &[MilestoneDraft],
    ) -> impl Future<Output = DbResult<ProjectFull>> + Send;

    fn update_project(&self, id: &str, patch: &ProjectPatch) -> impl Future<Output = DbResult<ProjectFull>> + Send;

    fn delete_project(&self, id: &str) -> impl Future<Output = DbResult<()>> + Send;

    /// A new client and its first project.
    fn create_client_with_project(
        &self,
        client: &ClientDraft,
        project: &ProjectDraft,
        milestones: &[MilestoneDraft],
    ) -> impl Future<Output = DbResult<ProjectFull>> + Send {
        async move {
            let created = self.create_client(client).await?;
            self.create_project(&created.client.id, project, milestones).await
        }
    }

    /// Deletes project `old_id` and creates its replacement under `client_id`.
    fn replace_project(
        &self,
        old_id: &str,
        client_id: &str,
        project: &ProjectDraft,
        milestones: &[MilestoneDraft],
    ) -> impl Future<Output = DbResult<ProjectFull>> + Send {
        async move {
            self.delete_project(old_id).await?;
            self.create_project(client_id, project, milestones).await
        }
    }
}

impl RecordStore for Database {
    async fn find_clients_by_query(&self, text: &str) -> DbResult<Vec<ClientSummary>> {
        self.clients().search(text, CLIENT_SEARCH_LIMIT).await
    }

    async fn get_client_by_id(&self, id: &str) -> DbResult<ClientFull> {
        self.clients()
            .get_full(id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    async fn create_client(&self, draft: &ClientDraft) -> DbResult<ClientFull> {
        let client = self.clients().insert(draft).await?;
        Ok(ClientFull {
            client,
            projects: Vec::new(),
        })
    }

    async fn create_project(
        &self,
        client_id: &str,
        project: &ProjectDraft,
        milestones: &[MilestoneDraft],
    ) -> DbResult<ProjectFull> {
        self.projects().insert(client_id, project, milestones).await
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> DbResult<ProjectFull> {
        self.projects().patch(id, patch).await
    }

    async fn delete_project(&self, id: &str) -> DbResult<()> {
        self.projects().delete(id).await
    }

    /// One transaction: both or neither.
    async fn create_client_with_project(
        &self,
        client: &ClientDraft,
        project: &ProjectDraft,
        milestones: &[MilestoneDraft],
    ) -> DbResult<ProjectFull> {
        let mut tx = self.pool().begin().await?;
        let client = ClientRepository::insert_with(&mut *tx, client).await?;
        let project = ProjectRepository::insert_with(&mut *tx, &client.id, project, milestones).await?;
        tx.commit().await?;
        Ok(project)
    }

    /// One transaction: the old project survives a failed create.
    async fn replace_project(
        &self,
        old_id: &str,
        client_id: &str,
        project: &ProjectDraft,
        milestones: &[MilestoneDraft],
    ) -> DbResult<ProjectFull> {
        self.projects().replace(old_id, client_id, project, milestones).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;
    use billwise_core::Money;

    #[tokio::test]
    async fn test_database_as_record_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let project = ProjectDraft {
            name: "Portal".into(),
            ..ProjectDraft::default()
        };
        let saved = db
            .create_client_with_project(
                &ClientDraft {
                    name: "Acme".into(),
                    email: "ops@acme.io".into(),
                    ..ClientDraft::default()
                },
                &project,
                &[MilestoneDraft::new("All", Money::from_minor(100))],
            )
            .await
            .unwrap();
        let client_id = saved.project.client_id.clone();

        let full = db.get_client_by_id(&client_id).await.unwrap();
        assert_eq!(full.client.name, "Acme");
        assert_eq!(full.projects.len(), 1);
        assert_eq!(full.projects[0].id, saved.project.id);

        let found = db.find_clients_by_query("ACME.IO").await.unwrap();
        assert_eq!(found.len(), 1);

        let replaced = db
            .replace_project(&saved.project.id, &client_id, &project, &[])
            .await
            .unwrap();
        let full = db.get_client_by_id(&client_id).await.unwrap();
        assert_eq!(full.projects.len(), 1);
        assert_eq!(full.projects[0].id, replaced.project.id);

        let other = db
            .create_client(&ClientDraft {
                name: "Globex".into(),
                ..ClientDraft::default()
            })
            .await
            .unwrap();
        assert!(other.projects.is_empty());

        db.delete_project(&replaced.project.id).await.unwrap();
        assert!(db.get_client_by_id(&client_id).await.unwrap().projects.is_empty());
    }

    #[tokio::test]
    async fn test_failed_first_project_leaves_no_client() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_projects BEFORE INSERT ON projects BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let result = db
            .create_client_with_project(
                &ClientDraft {
                    name: "Acme".into(),
                    ..ClientDraft::default()
                },
                &ProjectDraft {
                    name: "Portal".into(),
                    ..ProjectDraft::default()
                },
                &[],
            )
            .await;
        assert!(result.is_err());
        assert!(db.find_clients_by_query("Acme").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_client_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.get_client_by_id("nope").await.unwrap_err().is_not_found());
    }
}
