//! # Repository Module
//!
//! Database repository implementations for Billwise.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command / ProjectFlow                                                 │
//! │       │                                                                 │
//! │       │  db.clients().search("acme", 20)                               │
//! │       ▼                                                                 │
//! │  ClientRepository              ProjectRepository                       │
//! │  ├── search(query, limit)      ├── insert(client, project, milestones) │
//! │  ├── get_by_id(id)             ├── get_full(id)                        │
//! │  ├── get_full(id)              ├── list_by_client(client_id)           │
//! │  └── insert(draft)             ├── patch(id, patch)                    │
//! │                                ├── delete(id)                          │
//! │                                └── replace(old, client, ...)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod project;
