//! Session history log for Quickfire.
//!
//! Each completed session is appended as one JSON line to
//! `<home>/history.jsonl`. The log is append-only.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{CompletionReason, SessionConfig, SessionState};
use crate::error::{QuickfireError, Result};
use crate::stats::scoring::Tally;
use crate::stats::summary::SessionSummary;
use crate::util::read_to_string_limited;

/// Schema version for history records.
pub const HISTORY_SCHEMA_VERSION: u8 = 1;

/// One completed session, as written to the history log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    /// Schema version for forward compatibility.
    pub v: u8,
    /// Session id.
    pub id: String,
    /// Selection mode name.
    pub session_type: String,
    /// Ids of the items played, in play order.
    pub flashcard_ids: Vec<String>,
    pub total_cards: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub session_duration_seconds: u64,
    /// Accuracy over answered items.
    pub accuracy_percent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionReason>,
    pub completed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Build a record from a finished session.
    pub fn from_session(
        state: &SessionState,
        config: &SessionConfig,
        summary: &SessionSummary,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            v: HISTORY_SCHEMA_VERSION,
            id: state.id.clone(),
            session_type: config.mode.as_str().to_string(),
            flashcard_ids: state.items.iter().map(|i| i.id.clone()).collect(),
            total_cards: summary.total_items,
            correct_answers: summary.correct_count,
            incorrect_answers: summary.incorrect_count(),
            session_duration_seconds: summary.elapsed_seconds,
            accuracy_percent: summary.accuracy_percent,
            completion: summary.completion,
            completed_at: state.completed_at.unwrap_or(now),
        }
    }
}

/// Totals across the history log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub sessions: usize,
    pub cards_answered: usize,
    pub correct_answers: usize,
    /// Accuracy over every answered card, rounded half up.
    pub overall_accuracy_percent: u32,
    pub total_seconds: u64,
    pub timed_out: usize,
    pub abandoned: usize,
}

impl HistoryStats {
    /// Aggregate a set of records.
    pub fn from_records(records: &[SessionRecord]) -> Self {
        let mut stats = Self {
            sessions: records.len(),
            ..Self::default()
        };

        for record in records {
            stats.cards_answered += record.correct_answers + record.incorrect_answers;
            stats.correct_answers += record.correct_answers;
            stats.total_seconds += record.session_duration_seconds;
            match record.completion {
                Some(CompletionReason::TimedOut) => stats.timed_out += 1,
                Some(CompletionReason::Abandoned) => stats.abandoned += 1,
                _ => {}
            }
        }

        stats.overall_accuracy_percent = Tally {
            answered: stats.cards_answered,
            correct: stats.correct_answers,
        }
        .percent();
        stats
    }
}

/// Append-only JSONL writer for session records.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// Create a history log at the given path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append a record to the log.
    pub fn append(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| QuickfireError::storage(parent, e))?;
        }

        let json = serde_json::to_string(record)
            .map_err(|e| QuickfireError::serde(format!("Failed to serialize session: {}", e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| QuickfireError::storage(&self.path, e))?;

        writeln!(file, "{}", json).map_err(|e| QuickfireError::storage(&self.path, e))?;
        Ok(())
    }

    /// Read all records, oldest first.
    pub fn read_all(&self) -> Result<Vec<SessionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = read_to_string_limited(&self.path)?;

        let mut records = Vec::new();
        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let record: SessionRecord = serde_json::from_str(line).map_err(|e| {
                QuickfireError::serde(format!(
                    "Failed to parse session record on line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            records.push(record);
        }

        Ok(records)
    }

    /// The `limit` most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut records = self.read_all()?;
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
