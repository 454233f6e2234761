//! Card storage traits for Quickfire.
//!
//! `CardSource` supplies review items; `PersistenceAdapter` writes answer
//! results back. `ResultSink` is the engine-facing side: the engine hands
//! results to a sink and never waits for the write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ReviewItem;
use crate::error::Result;

/// One answered item, as sent to persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRecord {
    /// Session the answer belongs to.
    pub session_id: String,
    /// Answered item.
    pub item_id: String,
    /// Whether the answer was correct.
    pub was_correct: bool,
    /// When the answer was submitted.
    pub answered_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Create a new result record.
    pub fn new(
        session_id: impl Into<String>,
        item_id: impl Into<String>,
        was_correct: bool,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            item_id: item_id.into(),
            was_correct,
            answered_at,
        }
    }

    /// Key used to apply a result at most once.
    pub fn dedup_key(&self) -> (String, String) {
        (self.session_id.clone(), self.item_id.clone())
    }
}

/// Trait for card sources.
pub trait CardSource: Send + Sync {
    /// List all items in insertion order.
    fn list_items(&self) -> Result<Vec<ReviewItem>>;
}

/// Trait for result persistence backends.
///
/// Implementations must be idempotent per `(session_id, item_id)`: a repeat
/// of an applied record returns `Ok(())` without changing stats.
pub trait PersistenceAdapter: Send + Sync {
    /// Record one answered item.
    fn record_result(&self, record: &ResultRecord) -> Result<()>;
}

/// Receives results from a running engine.
///
/// `submit` must return without waiting for the write and must not fail;
/// errors are the sink's to log.
pub trait ResultSink {
    /// Hand over one result.
    fn submit(&self, record: ResultRecord);
}

impl<T: CardSource + ?Sized> CardSource for Arc<T> {
    fn list_items(&self) -> Result<Vec<ReviewItem>> {
        (**self).list_items()
    }
}

impl<T: PersistenceAdapter + ?Sized> PersistenceAdapter for Arc<T> {
    fn record_result(&self, record: &ResultRecord) -> Result<()> {
        (**self).record_result(record)
    }
}

impl<T: ResultSink + ?Sized> ResultSink for Arc<T> {
    fn submit(&self, record: ResultRecord) {
        (**self).submit(record)
    }
}
