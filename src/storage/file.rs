//! File-based card storage for Quickfire.
//!
//! A deck is a JSON array of cards. Results are written back with a
//! read-modify-write under a lock, and the file is replaced atomically.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::{normalize_cards, RawCard, ReviewItem};
use crate::error::{QuickfireError, Result};
use crate::storage::{CardSource, PersistenceAdapter, ResultRecord};
use crate::util::{atomic_write, read_to_string_limited};

/// JSON deck file store.
#[derive(Debug)]
pub struct FileCardStore {
    /// Path of the deck file.
    path: PathBuf,
    /// Results already applied; also serializes writers.
    applied: Mutex<HashSet<(String, String)>>,
}

impl FileCardStore {
    /// Open a deck file. The file is read lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            applied: Mutex::new(HashSet::new()),
        }
    }

    /// Write a new deck file with the given items and open it.
    pub fn create(path: impl Into<PathBuf>, items: &[ReviewItem]) -> Result<Self> {
        let store = Self::new(path);
        store.write_items(items)?;
        Ok(store)
    }

    /// Path of the deck file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> Result<Vec<ReviewItem>> {
        let content = read_to_string_limited(&self.path)?;
        let raw: Vec<RawCard> = serde_json::from_str(&content).map_err(|e| {
            QuickfireError::serde(format!(
                "Failed to parse deck {}: {}",
                self.path.display(),
                e
            ))
        })?;
        normalize_cards(raw)
    }

    fn write_items(&self, items: &[ReviewItem]) -> Result<()> {
        let raw: Vec<RawCard> = items.iter().map(RawCard::from).collect();
        let json = serde_json::to_string_pretty(&raw)?;
        atomic_write(&self.path, json.as_bytes())
    }
}

impl CardSource for FileCardStore {
    fn list_items(&self) -> Result<Vec<ReviewItem>> {
        self.read_items()
    }
}

impl PersistenceAdapter for FileCardStore {
    fn record_result(&self, record: &ResultRecord) -> Result<()> {
        let mut applied = self
            .applied
            .lock()
            .map_err(|_| QuickfireError::persistence(&record.item_id, "deck lock poisoned"))?;

        let key = record.dedup_key();
        if applied.contains(&key) {
            tracing::debug!(item = %record.item_id, "result already applied, ignoring");
            return Ok(());
        }

        let mut items = self
            .read_items()
            .map_err(|e| QuickfireError::persistence(&record.item_id, e.to_string()))?;
        let item = items
            .iter_mut()
            .find(|item| item.id == record.item_id)
            .ok_or_else(|| QuickfireError::persistence(&record.item_id, "no such card"))?;
        item.record(record.was_correct, record.answered_at);

        self.write_items(&items)
            .map_err(|e| QuickfireError::persistence(&record.item_id, e.to_string()))?;
        applied.insert(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::test_store_records_results;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_store(items: &[ReviewItem]) -> (FileCardStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileCardStore::create(dir.path().join("deck.json"), items).unwrap();
        (store, dir)
    }

    #[test]
    fn test_file_store_records_results() {
        let (store, _dir) = create_test_store(&[
            ReviewItem::new("c1", "q1", "a1"),
            ReviewItem::new("c2", "q2", "a2"),
        ]);
        test_store_records_results(&store);
    }

    #[test]
    fn test_list_preserves_order() {
        let (store, _dir) = create_test_store(&[
            ReviewItem::new("z", "q", "a"),
            ReviewItem::new("a", "q", "a"),
            ReviewItem::new("m", "q", "a"),
        ]);

        let ids: Vec<String> = store.list_items().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_results_survive_reopen() {
        let (store, dir) = create_test_store(&[ReviewItem::new("c1", "q", "a")]);
        store
            .record_result(&ResultRecord::new("s1", "c1", true, chrono::Utc::now()))
            .unwrap();

        let reopened = FileCardStore::new(dir.path().join("deck.json"));
        let items = reopened.list_items().unwrap();
        assert_eq!(items[0].times_reviewed, 1);
        assert_eq!(items[0].times_correct, 1);
    }

    #[test]
    fn test_missing_deck_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let store = FileCardStore::new(dir.path().join("missing.json"));

        assert!(matches!(
            store.list_items(),
            Err(QuickfireError::Storage { .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_serde_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deck.json");
        fs::write(&path, "{ not a deck").unwrap();

        let store = FileCardStore::new(&path);
        assert!(matches!(store.list_items(), Err(QuickfireError::Serde { .. })));
    }

    #[test]
    fn test_reads_exported_column_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deck.json");
        fs::write(
            &path,
            r#"[
                {"id": "f1", "front_content": "2 + 2", "back_content": "4", "times_reviewed": null},
                {"id": "f2", "prompt": "3 x 25", "answer": "75", "times_reviewed": 4, "times_correct": 3}
            ]"#,
        )
        .unwrap();

        let items = FileCardStore::new(&path).list_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].answer, "4");
        assert_eq!(items[0].times_reviewed, 0);
        assert_eq!(items[1].times_correct, 3);
    }

    #[test]
    fn test_write_failure_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let store = FileCardStore::new(dir.path().join("missing.json"));

        let result =
            store.record_result(&ResultRecord::new("s1", "c1", true, chrono::Utc::now()));
        assert!(matches!(
            result,
            Err(QuickfireError::PersistenceWrite { .. })
        ));
    }
}
