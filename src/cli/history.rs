//! History command for Quickfire.
//!
//! Lists recent sessions from the history log with overall totals.

use serde::{Deserialize, Serialize};

use crate::stats::{HistoryLog, HistoryStats, SessionRecord};

/// Options for the history command.
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Output as JSON.
    pub json: bool,
    /// Maximum number of sessions to show.
    pub limit: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            json: false,
            limit: 10,
        }
    }
}

/// Output format for the history command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// Most recent sessions, newest first.
    pub sessions: Vec<SessionRecord>,
    /// Totals over the whole log.
    pub stats: HistoryStats,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryOutput {
    /// Create a successful output.
    pub fn success(sessions: Vec<SessionRecord>, stats: HistoryStats) -> Self {
        Self {
            success: true,
            sessions,
            stats,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            sessions: vec![],
            stats: HistoryStats::default(),
            error: Some(error.into()),
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        if !self.success {
            return format!(
                "History failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }

        if self.sessions.is_empty() {
            return "No sessions recorded yet.".to_string();
        }

        let mut lines = vec![format!(
            "{} sessions, {} cards answered, {}% overall accuracy, {}s played",
            self.stats.sessions,
            self.stats.cards_answered,
            self.stats.overall_accuracy_percent,
            self.stats.total_seconds
        )];
        lines.push(String::new());
        lines.push(format!(
            "{:<20}  {:<20}  {:>7}  {:>8}  {:>6}",
            "COMPLETED", "MODE", "CORRECT", "ACCURACY", "TIME"
        ));
        lines.push("-".repeat(70));

        for record in &self.sessions {
            let completed = record.completed_at.format("%Y-%m-%d %H:%M:%S").to_string();
            lines.push(format!(
                "{:<20}  {:<20}  {:>7}  {:>7}%  {:>5}s",
                completed,
                record.session_type,
                format!("{}/{}", record.correct_answers, record.total_cards),
                record.accuracy_percent,
                record.session_duration_seconds
            ));
        }

        lines.join("\n")
    }
}

/// The history command implementation.
pub struct HistoryCommand {
    log: HistoryLog,
}

impl HistoryCommand {
    /// Create a new history command.
    pub fn new(log: HistoryLog) -> Self {
        Self { log }
    }

    /// Run the history command.
    pub fn run(&self, options: &HistoryOptions) -> HistoryOutput {
        match self.log.read_all() {
            Ok(records) => {
                let stats = HistoryStats::from_records(&records);
                let recent = records.into_iter().rev().take(options.limit).collect();
                HistoryOutput::success(recent, stats)
            }
            Err(e) => HistoryOutput::failure(format!("Failed to read history: {}", e)),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &HistoryOutput, options: &HistoryOptions) -> String {
        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            output.format_text()
        }
    }
}
