//! In-memory card storage.
//!
//! Thread-safe implementation of `CardSource` and `PersistenceAdapter`,
//! used by tests and by callers that manage persistence themselves.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::core::ReviewItem;
use crate::error::{QuickfireError, Result};
use crate::storage::{CardSource, PersistenceAdapter, ResultRecord};

#[derive(Debug, Default)]
struct Inner {
    items: Vec<ReviewItem>,
    applied: HashSet<(String, String)>,
}

/// In-memory card store.
///
/// Items keep their insertion order. Contents are lost when the store is
/// dropped.
#[derive(Debug, Default)]
pub struct MemoryCardStore {
    inner: RwLock<Inner>,
}

impl MemoryCardStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given items.
    pub fn with_items(items: Vec<ReviewItem>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                items,
                applied: HashSet::new(),
            }),
        }
    }

    /// Add an item, replacing any item with the same id in place.
    pub fn insert(&self, item: ReviewItem) {
        let mut inner = self.inner.write().unwrap();
        match inner.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => inner.items.push(item),
        }
    }

    /// Look up an item by id.
    pub fn get(&self, id: &str) -> Option<ReviewItem> {
        let inner = self.inner.read().unwrap();
        inner.items.iter().find(|item| item.id == id).cloned()
    }

    /// Get the number of items in the store.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().items.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().items.is_empty()
    }
}

impl CardSource for MemoryCardStore {
    fn list_items(&self) -> Result<Vec<ReviewItem>> {
        Ok(self.inner.read().unwrap().items.clone())
    }
}

impl PersistenceAdapter for MemoryCardStore {
    fn record_result(&self, record: &ResultRecord) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let key = record.dedup_key();
        if inner.applied.contains(&key) {
            tracing::debug!(item = %record.item_id, "result already applied, ignoring");
            return Ok(());
        }

        let item = inner
            .items
            .iter_mut()
            .find(|item| item.id == record.item_id)
            .ok_or_else(|| QuickfireError::persistence(&record.item_id, "no such card"))?;
        item.record(record.was_correct, record.answered_at);
        inner.applied.insert(key);
        Ok(())
    }
}
