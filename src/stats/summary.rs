//! End-of-session reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{CompletionReason, SessionConfig, SessionState};
use crate::stats::scoring::Tally;

/// Final report for a completed session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSummary {
    /// Session the report belongs to.
    pub session_id: String,
    /// Items selected for the session, answered or not.
    pub total_items: usize,
    /// Items that received an answer.
    pub answered_count: usize,
    /// Correct answers.
    pub correct_count: usize,
    /// Rounded accuracy over answered items; 0 when nothing was answered.
    pub accuracy_percent: u32,
    /// Time spent in the session.
    pub elapsed_seconds: u64,
    /// Whether the configured accuracy target was reached.
    pub met_target: bool,
    /// Why the session ended, if it has.
    pub completion: Option<CompletionReason>,
}

impl SessionSummary {
    /// Build a summary from session state.
    ///
    /// `now` only matters for untimed sessions that have no completion time
    /// yet.
    pub fn build(state: &SessionState, config: &SessionConfig, now: DateTime<Utc>) -> Self {
        let tally = Tally::from_answers(&state.answers);
        let accuracy_percent = tally.percent();

        let met_target = config
            .target_accuracy_percent
            .is_some_and(|target| accuracy_percent >= target);

        Self {
            session_id: state.id.clone(),
            total_items: state.total_items(),
            answered_count: tally.answered,
            correct_count: tally.correct,
            accuracy_percent,
            elapsed_seconds: elapsed_seconds(state, config, now),
            met_target,
            completion: state.completion,
        }
    }

    /// Number of answered items that were wrong.
    pub fn incorrect_count(&self) -> usize {
        self.answered_count - self.correct_count
    }

    /// Items never answered (time ran out or the session was abandoned).
    pub fn unanswered_count(&self) -> usize {
        self.total_items - self.answered_count
    }
}

/// Seconds spent in a session.
///
/// Timed sessions count consumed countdown seconds. Untimed sessions use the
/// wall-clock span from start to completion.
fn elapsed_seconds(state: &SessionState, config: &SessionConfig, now: DateTime<Utc>) -> u64 {
    if let (Some(limit), Some(remaining)) = (config.time_limit_seconds, state.remaining_seconds) {
        return u64::from(limit.saturating_sub(remaining));
    }

    let Some(started_at) = state.started_at else {
        return 0;
    };
    let ended_at = state.completed_at.unwrap_or(now);
    ended_at
        .signed_duration_since(started_at)
        .num_seconds()
        .max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnswerRecord, Phase, ReviewItem};
    use chrono::Duration;

    fn state_with(answers: &[bool], total: usize) -> SessionState {
        let items = (0..total)
            .map(|i| ReviewItem::new(format!("c{}", i), "q", "a"))
            .collect();
        let mut state = SessionState::new(items);
        state.phase = Phase::Completed;
        for (index, &correct) in answers.iter().enumerate() {
            state.answers.push(AnswerRecord {
                index,
                item_id: format!("c{}", index),
                submitted: "a".to_string(),
                correct,
                answered_at: Utc::now(),
            });
        }
        state.current_index = answers.len();
        state
    }

    #[test]
    fn test_no_answers_gives_zero_accuracy() {
        let state = state_with(&[], 3);
        let config = SessionConfig::default().with_target_accuracy(0);

        let summary = SessionSummary::build(&state, &config, Utc::now());

        assert_eq!(summary.answered_count, 0);
        assert_eq!(summary.accuracy_percent, 0);
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.unanswered_count(), 3);
        // A zero target is met even by zero accuracy.
        assert!(summary.met_target);
    }

    #[test]
    fn test_full_pass_meets_target() {
        let state = state_with(&[true, true, true], 3);
        let config = SessionConfig::default().with_target_accuracy(80);

        let summary = SessionSummary::build(&state, &config, Utc::now());

        assert_eq!(summary.accuracy_percent, 100);
        assert!(summary.met_target);
    }

    #[test]
    fn test_below_target() {
        let state = state_with(&[true, false, false], 3);
        let config = SessionConfig::default().with_target_accuracy(80);

        let summary = SessionSummary::build(&state, &config, Utc::now());

        assert_eq!(summary.accuracy_percent, 33);
        assert_eq!(summary.incorrect_count(), 2);
        assert!(!summary.met_target);
    }

    #[test]
    fn test_no_target_never_met() {
        let state = state_with(&[true], 1);
        let summary = SessionSummary::build(&state, &SessionConfig::default(), Utc::now());
        assert!(!summary.met_target);
    }

    #[test]
    fn test_elapsed_timed_uses_countdown() {
        let mut state = state_with(&[true], 2);
        state.remaining_seconds = Some(42);
        let config = SessionConfig::default().with_time_limit(60);

        let summary = SessionSummary::build(&state, &config, Utc::now());
        assert_eq!(summary.elapsed_seconds, 18);
    }

    #[test]
    fn test_elapsed_untimed_uses_wall_clock() {
        let mut state = state_with(&[true], 1);
        let start = Utc::now();
        state.started_at = Some(start);
        state.completed_at = Some(start + Duration::seconds(95));

        let summary = SessionSummary::build(&state, &SessionConfig::default(), Utc::now());
        assert_eq!(summary.elapsed_seconds, 95);
    }

    #[test]
    fn test_elapsed_untimed_falls_back_to_now() {
        let mut state = state_with(&[], 1);
        let start = Utc::now();
        state.started_at = Some(start);

        let summary = SessionSummary::build(
            &state,
            &SessionConfig::default(),
            start + Duration::seconds(12),
        );
        assert_eq!(summary.elapsed_seconds, 12);
    }

    #[test]
    fn test_elapsed_never_negative() {
        let mut state = state_with(&[], 1);
        let start = Utc::now();
        state.started_at = Some(start);
        state.completed_at = Some(start - Duration::seconds(5));

        let summary = SessionSummary::build(&state, &SessionConfig::default(), Utc::now());
        assert_eq!(summary.elapsed_seconds, 0);
    }
}
