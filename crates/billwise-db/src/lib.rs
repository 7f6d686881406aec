//! # billwise-db: Persistence Layer for Billwise
//!
//! SQLite record store for clients, projects and milestones, plus the
//! pending-draft store.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billwise Data Flow                               │
//! │                                                                         │
//! │  billwise-cli (ProjectFlow<S: RecordStore>)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   billwise-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ ClientRepo    │    │ 001_initial  │  │   │
//! │  │   │  RecordStore  │    │ ProjectRepo   │    │  (embedded)  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────────────────────────┐                        │   │
//! │  │   │ DraftStore: Memory | File (JSON)  │                        │   │
//! │  │   └───────────────────────────────────┘                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (data dir)/billwise.db                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billwise_db::{Database, DbConfig, RecordStore};
//!
//! let db = Database::new(DbConfig::new("billwise.db")).await?;
//! let candidates = db.find_clients_by_query("acme").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod drafts;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use drafts::{DraftStore, FileDraftStore, MemoryDraftStore};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::RecordStore;

pub use repository::client::ClientRepository;
pub use repository::project::ProjectRepository;
