//! # Client Repository
//!
//! Database operations for clients.
//!
//! ## Narrowing Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  search("john")                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  name LIKE '%john%' OR email LIKE '%john%'   (case-insensitive)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  John Smith, Johnny Smithson, ops@johnsons.io                          │
//! │                                                                         │
//! │  Rows whose whole name or email equals the query sort first, so the    │
//! │  limit never drops an exact match in favour of near misses.            │
//! │                                                                         │
//! │  Deliberately broad. The exact duplicate filter lives in               │
//! │  billwise_core::reconciliation.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::project::ProjectRepository;
use billwise_core::{ClientDraft, ClientFull, ClientRecord, ClientSummary};

/// Repository for client database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ClientRepository::new(pool);
///
/// let candidates = repo.search("acme", 20).await?;
/// let client = repo.get_full("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Finds clients whose name or email contains `query`.
    ///
    /// Exact (case-insensitive) name or email matches come first, then the
    /// rest alphabetically. An empty query lists clients alphabetically.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<ClientSummary>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching clients");

        let pattern = format!("%{}%", escape_like(query));

        let clients: Vec<ClientSummary> = sqlx::query_as(
            r#"
            SELECT id, name, email, company
            FROM clients
            WHERE name LIKE ?1 ESCAPE '\' OR email LIKE ?1 ESCAPE '\'
            ORDER BY
                (?2 <> '' AND (lower(trim(name)) = lower(?2) OR lower(trim(email)) = lower(?2))) DESC,
                name COLLATE NOCASE
            LIMIT ?3
            "#,
        )
        .bind(&pattern)
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = clients.len(), "Client search returned");
        Ok(clients)
    }

    /// Gets a client by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ClientRecord>> {
        let client: Option<ClientRecord> = sqlx::query_as(
            r#"
            SELECT id, name, email, company, phone, notes, created_at, updated_at
            FROM clients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Gets a client together with the names of its projects.
    pub async fn get_full(&self, id: &str) -> DbResult<Option<ClientFull>> {
        let Some(client) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let projects = ProjectRepository::new(self.pool.clone()).list_by_client(id).await?;
        Ok(Some(ClientFull { client, projects }))
    }

    /// Inserts a client from a draft. Text fields are trimmed; blank
    /// optional fields are stored as NULL.
    pub async fn insert(&self, draft: &ClientDraft) -> DbResult<ClientRecord> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_with(&mut *conn, draft).await
    }

    /// [`insert`](Self::insert) on a caller-held connection or transaction.
    pub(crate) async fn insert_with(conn: &mut SqliteConnection, draft: &ClientDraft) -> DbResult<ClientRecord> {
        let now = Utc::now();
        let client = ClientRecord {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            email: draft.email.trim().to_string(),
            company: non_blank(&draft.company),
            phone: non_blank(&draft.phone),
            notes: non_blank(&draft.notes),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %client.id, name = %client.name, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, email, company, phone, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.company)
        .bind(&client.phone)
        .bind(&client.notes)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(client)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn draft(name: &str, email: &str) -> ClientDraft {
        ClientDraft {
            name: name.to_string(),
            email: email.to_string(),
            ..ClientDraft::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.clients();

        let mut input = draft("  Acme Corp ", "ops@acme.io");
        input.company = Some("   ".to_string());
        let inserted = repo.insert(&input).await.unwrap();
        assert_eq!(inserted.name, "Acme Corp");
        assert!(inserted.company.is_none());

        let loaded = repo.get_by_id(&inserted.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, inserted.id);
        assert_eq!(loaded.email, "ops@acme.io");

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_is_broad_and_case_insensitive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.clients();

        repo.insert(&draft("John Smith", "john@smith.io")).await.unwrap();
        repo.insert(&draft("Johnny Smithson", "js@x.io")).await.unwrap();
        repo.insert(&draft("Acme", "billing@JOHNSONS.io")).await.unwrap();
        repo.insert(&draft("Other", "other@x.io")).await.unwrap();

        let results = repo.search("JOHN", 20).await.unwrap();
        assert_eq!(results.len(), 3);

        let limited = repo.search("", 2).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.clients();

        repo.insert(&draft("100% Design", "")).await.unwrap();
        repo.insert(&draft("1000 Designs", "")).await.unwrap();

        let results = repo.search("100%", 20).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "100% Design");
    }

    #[tokio::test]
    async fn test_exact_match_survives_the_limit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.clients();

        for i in 0..25 {
            repo.insert(&draft(&format!("A{:02} Zeta Corp", i), "")).await.unwrap();
        }
        repo.insert(&draft("Zeta Corp", "")).await.unwrap();
        repo.insert(&draft("Zed", "ZETA CORP")).await.unwrap();

        let results = repo.search(" zeta corp ", 20).await.unwrap();
        assert_eq!(results.len(), 20);
        let exact: Vec<_> = results[..2].iter().map(|c| c.name.as_str()).collect();
        assert_eq!(exact, vec!["Zed", "Zeta Corp"]);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a_b%c\\"), "a\\_b\\%c\\\\");
    }
}
