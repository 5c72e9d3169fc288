//! File-collection slice
//!
//! Holds the last full result of a list query plus a separate shared-files
//! list, one loading flag and one error string. Mutations (add/remove a
//! single record) are optimistic local edits that are never reconciled
//! against the server; a later full reload is the only re-sync mechanism.
//!
//! Loads carry a generation number issued by `RequestSequence`. A result
//! belonging to a generation older than the newest started load is stale
//! and is discarded instead of overwriting fresher state, so two
//! overlapping reloads can no longer leave the slice showing the loser.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::api::types::FileRecord;

/// Monotonic generation counter for in-flight loads
#[derive(Debug, Default)]
pub struct RequestSequence(AtomicU64);

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next generation number
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Immutable snapshot of the file collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileState {
    pub files: Vec<FileRecord>,
    pub shared_files: Vec<FileRecord>,
    pub loading: bool,
    pub error: Option<String>,
    /// Newest load generation seen so far
    pub generation: u64,
}

/// Slice transitions
#[derive(Debug, Clone)]
pub enum FileAction {
    /// A list (or shared-list) request went out
    LoadStarted { generation: u64 },
    /// Full own-files result
    FilesLoaded { generation: u64, files: Vec<FileRecord> },
    /// Full shared-with-me result
    SharedLoaded { generation: u64, files: Vec<FileRecord> },
    /// Optimistic local insert after a successful upload
    FileAdded(FileRecord),
    /// Optimistic local removal after a successful delete
    FileRemoved(Uuid),
    /// Operation failed; message is the single displayed error
    Failed { generation: u64, message: String },
}

impl FileState {
    /// Pure reducer: returns the next state, leaving the input untouched.
    /// Results from superseded generations return the state unchanged.
    pub fn apply(&self, action: FileAction) -> FileState {
        let mut next = self.clone();
        match action {
            FileAction::LoadStarted { generation } => {
                if generation < next.generation {
                    return next;
                }
                next.generation = generation;
                next.loading = true;
                next.error = None;
            }
            FileAction::FilesLoaded { generation, files } => {
                if generation < next.generation {
                    return next;
                }
                next.files = files;
                next.loading = false;
            }
            FileAction::SharedLoaded { generation, files } => {
                if generation < next.generation {
                    return next;
                }
                next.shared_files = files;
                next.loading = false;
            }
            FileAction::FileAdded(record) => {
                next.files.push(record);
            }
            FileAction::FileRemoved(id) => {
                next.files.retain(|f| f.id != id);
            }
            FileAction::Failed { generation, message } => {
                if generation < next.generation {
                    return next;
                }
                next.error = Some(message);
                next.loading = false;
            }
        }
        next
    }

    pub fn find(&self, id: Uuid) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(name: &str) -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            size: 12,
            content_type: None,
            uploaded_at: Utc::now(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn loaded_list_replaces_wholesale() {
        let seq = RequestSequence::new();
        let g = seq.next();
        let state = FileState::default()
            .apply(FileAction::LoadStarted { generation: g })
            .apply(FileAction::FilesLoaded { generation: g, files: vec![record("test.txt")] });

        assert_eq!(state.files.len(), 1);
        assert_eq!(state.files[0].name, "test.txt");
        assert!(!state.loading);
        assert!(state.error.is_none());
        // The rendered row is keyed to a deletable id
        assert!(state.find(state.files[0].id).is_some());
    }

    #[test]
    fn removed_id_is_absent_from_the_next_snapshot() {
        let a = record("a.txt");
        let b = record("b.txt");
        let removed = a.id;
        let g = RequestSequence::new().next();
        let state = FileState::default()
            .apply(FileAction::FilesLoaded { generation: g, files: vec![a, b] })
            .apply(FileAction::FileRemoved(removed));

        assert_eq!(state.files.len(), 1);
        assert!(state.find(removed).is_none());
        assert_eq!(state.files[0].name, "b.txt");
    }

    #[test]
    fn stale_generation_result_is_discarded() {
        let seq = RequestSequence::new();
        let old = seq.next();
        let new = seq.next();

        // Two overlapping reloads: the later one starts, then the older
        // response arrives last. It must not win.
        let state = FileState::default()
            .apply(FileAction::LoadStarted { generation: old })
            .apply(FileAction::LoadStarted { generation: new })
            .apply(FileAction::FilesLoaded { generation: new, files: vec![record("fresh.txt")] })
            .apply(FileAction::FilesLoaded { generation: old, files: vec![record("stale.txt")] });

        assert_eq!(state.files.len(), 1);
        assert_eq!(state.files[0].name, "fresh.txt");
    }

    #[test]
    fn stale_failure_does_not_clobber_fresh_state() {
        let seq = RequestSequence::new();
        let old = seq.next();
        let new = seq.next();

        let state = FileState::default()
            .apply(FileAction::LoadStarted { generation: new })
            .apply(FileAction::FilesLoaded { generation: new, files: vec![record("keep.txt")] })
            .apply(FileAction::Failed { generation: old, message: "timeout".into() });

        assert!(state.error.is_none());
        assert_eq!(state.files[0].name, "keep.txt");
    }

    #[test]
    fn failure_sets_the_single_error_slot_and_stops_loading() {
        let g = RequestSequence::new().next();
        let state = FileState::default()
            .apply(FileAction::LoadStarted { generation: g })
            .apply(FileAction::Failed { generation: g, message: "Failed to load files".into() });

        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Failed to load files"));
    }

    #[test]
    fn shared_list_is_independent_of_own_files() {
        let g = RequestSequence::new().next();
        let state = FileState::default()
            .apply(FileAction::FilesLoaded { generation: g, files: vec![record("mine.txt")] })
            .apply(FileAction::SharedLoaded { generation: g, files: vec![record("theirs.txt")] });

        assert_eq!(state.files[0].name, "mine.txt");
        assert_eq!(state.shared_files[0].name, "theirs.txt");
    }

    #[test]
    fn reducer_leaves_the_input_snapshot_untouched() {
        let g = RequestSequence::new().next();
        let before = FileState::default()
            .apply(FileAction::FilesLoaded { generation: g, files: vec![record("x.txt")] });
        let id = before.files[0].id;

        let after = before.apply(FileAction::FileRemoved(id));
        assert_eq!(before.files.len(), 1);
        assert_eq!(after.files.len(), 0);
    }
}
