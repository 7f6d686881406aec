//! # Draft Store
//!
//! Keeps the in-progress engagement draft between steps, so an interrupted
//! import can be resumed and a finished one forgotten.
//!
//! ```text
//! import payload ──► save(draft) ──► [validate / resolve duplicates] ──► persist ──► clear()
//!                                         │ interrupted
//!                                         ▼
//!                                  next run: load() → Some(draft)
//! ```
//!
//! Two implementations:
//! - [`MemoryDraftStore`]: process-local, for tests and one-shot runs
//! - [`FileDraftStore`]: a JSON file; a missing file loads as `None`

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use billwise_core::EngagementDraft;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Load / save / clear of a single pending draft.
pub trait DraftStore {
    fn load(&self) -> DbResult<Option<EngagementDraft>>;
    fn save(&self, draft: &EngagementDraft) -> DbResult<()>;
    fn clear(&self) -> DbResult<()>;
}

// =============================================================================
// In-Memory
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    slot: Mutex<Option<EngagementDraft>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        MemoryDraftStore::default()
    }

    fn with_slot<T>(&self, f: impl FnOnce(&mut Option<EngagementDraft>) -> T) -> DbResult<T> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| DbError::Internal("draft store lock poisoned".to_string()))?;
        Ok(f(&mut slot))
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self) -> DbResult<Option<EngagementDraft>> {
        self.with_slot(|slot| slot.clone())
    }

    fn save(&self, draft: &EngagementDraft) -> DbResult<()> {
        self.with_slot(|slot| *slot = Some(draft.clone()))
    }

    fn clear(&self) -> DbResult<()> {
        self.with_slot(|slot| *slot = None)
    }
}

// =============================================================================
// JSON File
// =============================================================================

/// Stores the draft as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileDraftStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self) -> DbResult<Option<EngagementDraft>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %self.path.display(), "Loaded pending draft");
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Writes to a sibling temp file first, then renames over the target.
    fn save(&self, draft: &EngagementDraft) -> DbResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(draft)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), "Saved pending draft");
        Ok(())
    }

    fn clear(&self) -> DbResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cleared pending draft");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use billwise_core::{ClientDraft, Money, MilestoneDraft};

    fn sample() -> EngagementDraft {
        EngagementDraft {
            client: ClientDraft {
                name: "Acme".into(),
                ..ClientDraft::default()
            },
            milestones: vec![MilestoneDraft::new("Kickoff", Money::from_minor(1000))],
            ..EngagementDraft::default()
        }
    }

    fn exercise(store: &dyn DraftStore) {
        assert!(store.load().unwrap().is_none());

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());

        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryDraftStore::new());
    }

    #[test]
    fn test_file_store() {
        let dir = std::env::temp_dir().join(format!("billwise-drafts-{}", uuid::Uuid::new_v4()));
        let store = FileDraftStore::new(dir.join("pending.json"));

        exercise(&store);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = std::env::temp_dir().join(format!("billwise-drafts-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("pending.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileDraftStore::new(&path).load().unwrap_err();
        assert!(matches!(err, DbError::DraftCorrupt(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
