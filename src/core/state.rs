//! Session state types for Quickfire.
//!
//! These types hold the runtime state of one challenge session: the
//! selected items, the answers given so far, the countdown and the phase.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::card::ReviewItem;

/// Main session container.
///
/// Owned by a single `ChallengeEngine`; nothing else writes to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    /// Unique session identifier (UUID v4).
    pub id: String,
    /// Items selected for this session, in play order.
    pub items: Vec<ReviewItem>,
    /// Index of the item awaiting an answer.
    pub current_index: usize,
    /// Answers in submission order.
    pub answers: Vec<AnswerRecord>,
    /// Seconds left on the countdown, if the session is timed.
    pub remaining_seconds: Option<u32>,
    /// Current phase.
    pub phase: Phase,
    /// When the session was started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the session reached Completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Why the session completed.
    pub completion: Option<CompletionReason>,
    /// Trace events for debugging.
    pub trace: Vec<TraceEvent>,
}

impl SessionState {
    /// Create a not-yet-started session over the given items.
    pub fn new(items: Vec<ReviewItem>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            items,
            current_index: 0,
            answers: Vec::new(),
            remaining_seconds: None,
            phase: Phase::NotStarted,
            started_at: None,
            completed_at: None,
            completion: None,
            trace: Vec::new(),
        }
    }

    /// Number of items in the session.
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Number of answered items.
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Number of correct answers.
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.correct).count()
    }

    /// The item awaiting an answer, if any.
    pub fn current_item(&self) -> Option<&ReviewItem> {
        if self.phase != Phase::InProgress {
            return None;
        }
        self.items.get(self.current_index)
    }

    /// The answer recorded for an item index, if any.
    pub fn answer_for(&self, index: usize) -> Option<&AnswerRecord> {
        self.answers.iter().find(|a| a.index == index)
    }

    /// Add a trace event to the session.
    pub fn add_trace(&mut self, event_type: EventType, at: DateTime<Utc>, details: Option<String>) {
        self.trace.push(TraceEvent {
            event_type,
            timestamp: at,
            details,
        });
    }
}

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Items selected, waiting for start.
    #[default]
    NotStarted,
    /// Accepting answers and ticks.
    InProgress,
    /// Finished; only restart is accepted.
    Completed,
}

impl Phase {
    /// Check if the session has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::NotStarted => "not started",
            Phase::InProgress => "in progress",
            Phase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Why a session reached Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Every item was answered.
    AllAnswered,
    /// The countdown reached zero.
    TimedOut,
    /// The learner left the session.
    Abandoned,
}

/// One submitted answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerRecord {
    /// Index of the answered item.
    pub index: usize,
    /// Id of the answered item.
    pub item_id: String,
    /// What the learner typed.
    pub submitted: String,
    /// Whether the answer matched.
    pub correct: bool,
    /// When the answer was submitted.
    pub answered_at: DateTime<Utc>,
}

/// Individual trace event for debugging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceEvent {
    /// Type of event.
    pub event_type: EventType,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Optional details.
    pub details: Option<String>,
}

/// Event type enum for trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Items selected for a fresh session.
    ItemsSelected,
    /// Session started.
    SessionStarted,
    /// Answer recorded.
    AnswerRecorded,
    /// Countdown reached zero.
    TimedOut,
    /// Learner left the session.
    Abandoned,
    /// Session completed.
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<ReviewItem> {
        (0..n)
            .map(|i| ReviewItem::new(format!("c{}", i), format!("q{}", i), format!("a{}", i)))
            .collect()
    }

    fn answer(index: usize, correct: bool) -> AnswerRecord {
        AnswerRecord {
            index,
            item_id: format!("c{}", index),
            submitted: "x".to_string(),
            correct,
            answered_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_state_new() {
        let state = SessionState::new(items(3));

        assert_eq!(state.phase, Phase::NotStarted);
        assert_eq!(state.total_items(), 3);
        assert_eq!(state.current_index, 0);
        assert!(state.answers.is_empty());
        assert!(state.remaining_seconds.is_none());
        assert!(state.started_at.is_none());
        assert!(state.completion.is_none());
        assert!(!state.id.is_empty());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionState::new(items(1));
        let b = SessionState::new(items(1));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_current_item_only_in_progress() {
        let mut state = SessionState::new(items(2));
        assert!(state.current_item().is_none());

        state.phase = Phase::InProgress;
        assert_eq!(state.current_item().unwrap().id, "c0");

        state.current_index = 2;
        assert!(state.current_item().is_none());
    }

    #[test]
    fn test_counts() {
        let mut state = SessionState::new(items(3));
        state.answers.push(answer(0, true));
        state.answers.push(answer(1, false));

        assert_eq!(state.answered_count(), 2);
        assert_eq!(state.correct_count(), 1);
        assert!(state.answer_for(1).is_some());
        assert!(state.answer_for(2).is_none());
    }

    #[test]
    fn test_phase_is_terminal() {
        assert!(!Phase::NotStarted.is_terminal());
        assert!(!Phase::InProgress.is_terminal());
        assert!(Phase::Completed.is_terminal());
    }

    #[test]
    fn test_add_trace() {
        let mut state = SessionState::new(items(1));
        state.add_trace(EventType::SessionStarted, Utc::now(), None);

        assert_eq!(state.trace.len(), 1);
        assert_eq!(state.trace[0].event_type, EventType::SessionStarted);
    }

    #[test]
    fn test_full_session_roundtrip() {
        let mut state = SessionState::new(items(2));
        state.phase = Phase::Completed;
        state.answers.push(answer(0, true));
        state.completion = Some(CompletionReason::TimedOut);
        state.remaining_seconds = Some(0);

        let json = serde_json::to_string_pretty(&state).unwrap();
        let restored: SessionState = serde_json::from_str(&json).unwrap();

        assert_eq!(state, restored);
    }
}
