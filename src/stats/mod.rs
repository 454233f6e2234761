//! Scoring, summaries and session history for Quickfire.
//!
//! Scoring and summaries are pure functions over session state. Completed
//! sessions are appended to an append-only JSONL history log
//! (`<home>/history.jsonl`).

pub mod history;
pub mod scoring;
pub mod summary;

pub use history::{HistoryLog, HistoryStats, SessionRecord, HISTORY_SCHEMA_VERSION};
pub use scoring::{score, Tally};
pub use summary::SessionSummary;
