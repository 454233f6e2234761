//! Challenge engine: the session state machine.
//!
//! ```text
//! NotStarted --start--> InProgress --last answer / timeout / abandon--> Completed
//!      ^                                                                    |
//!      +------------------------------restart-------------------------------+
//! ```
//!
//! Every transition runs to completion on the caller's thread. The engine
//! never waits on persistence: answer results go to a `ResultSink`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::core::card::ReviewItem;
use crate::core::selector::SessionSelector;
use crate::core::session::SessionConfig;
use crate::core::state::{AnswerRecord, CompletionReason, EventType, Phase, SessionState};
use crate::error::{QuickfireError, Result};
use crate::stats::{score, SessionSummary, Tally};
use crate::storage::{CardSource, ResultRecord, ResultSink};

/// What happened to a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Index of the answered item.
    pub index: usize,
    /// Whether the answer was correct.
    pub correct: bool,
    /// The expected answer.
    pub expected: String,
    /// Whether this answer completed the session.
    pub completed: bool,
}

/// Builder for [`ChallengeEngine`].
pub struct EngineBuilder {
    source: Arc<dyn CardSource>,
    config: SessionConfig,
    selector: SessionSelector,
    sink: Option<Box<dyn ResultSink>>,
    seed: Option<u64>,
    selected_at: Option<DateTime<Utc>>,
}

impl EngineBuilder {
    /// Start building an engine over a card source.
    pub fn new(source: Arc<dyn CardSource>, config: SessionConfig) -> Self {
        Self {
            source,
            config,
            selector: SessionSelector::default(),
            sink: None,
            seed: None,
            selected_at: None,
        }
    }

    /// Use a custom selector.
    pub fn selector(mut self, selector: SessionSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Send answer results to a sink.
    pub fn sink(mut self, sink: impl ResultSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Seed the selection RNG for reproducible sessions.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Evaluate recency against this time instead of now.
    pub fn selected_at(mut self, now: DateTime<Utc>) -> Self {
        self.selected_at = Some(now);
        self
    }

    /// Validate the config and select the first session's items.
    pub fn build(self) -> Result<ChallengeEngine> {
        self.config.validate()?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let now = self.selected_at.unwrap_or_else(Utc::now);
        let items = self
            .selector
            .select(self.source.as_ref(), &self.config, now, &mut rng)?;

        let mut state = SessionState::new(items);
        state.remaining_seconds = self.config.time_limit_seconds;
        state.add_trace(
            EventType::ItemsSelected,
            now,
            Some(format!("{} items", state.total_items())),
        );

        Ok(ChallengeEngine {
            source: self.source,
            config: self.config,
            selector: self.selector,
            sink: self.sink,
            rng,
            state,
        })
    }
}

/// Challenge session state machine.
///
/// Owns the session state exclusively. All state mutations go through this
/// struct.
pub struct ChallengeEngine {
    source: Arc<dyn CardSource>,
    config: SessionConfig,
    selector: SessionSelector,
    sink: Option<Box<dyn ResultSink>>,
    rng: StdRng,
    state: SessionState,
}

impl ChallengeEngine {
    /// Start building an engine.
    pub fn builder(source: Arc<dyn CardSource>, config: SessionConfig) -> EngineBuilder {
        EngineBuilder::new(source, config)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Read-only view of the session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The session config.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The item awaiting an answer, if the session is in progress.
    pub fn current_item(&self) -> Option<&ReviewItem> {
        self.state.current_item()
    }

    /// Seconds left on the countdown, if timed.
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.state.remaining_seconds
    }

    /// Running accuracy over the answers so far.
    pub fn tally(&self) -> Tally {
        Tally::from_answers(&self.state.answers)
    }

    /// Running accuracy as a whole percentage; 0 before any answer.
    pub fn accuracy(&self) -> u32 {
        self.tally().percent()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Transition: NotStarted → InProgress.
    pub fn start(&mut self) -> Result<()> {
        self.start_at(Utc::now())
    }

    /// Transition: NotStarted → InProgress, at the given time.
    ///
    /// Fails with `EmptySource` when no items were selected.
    pub fn start_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state.phase != Phase::NotStarted {
            return Err(QuickfireError::invalid_transition("start", self.state.phase));
        }
        if self.state.items.is_empty() {
            return Err(QuickfireError::EmptySource);
        }

        self.state.phase = Phase::InProgress;
        self.state.current_index = 0;
        self.state.started_at = Some(now);
        self.state.remaining_seconds = self.config.time_limit_seconds;
        self.state.add_trace(EventType::SessionStarted, now, None);

        tracing::debug!(
            session = %self.state.id,
            items = self.state.total_items(),
            time_limit = ?self.config.time_limit_seconds,
            "session started"
        );
        Ok(())
    }

    /// Answer the item at `index`.
    pub fn submit_answer(&mut self, index: usize, answer: &str) -> Result<AnswerOutcome> {
        self.submit_answer_at(index, answer, Utc::now())
    }

    /// Answer the current item.
    pub fn submit_current(&mut self, answer: &str) -> Result<AnswerOutcome> {
        if self.state.phase != Phase::InProgress {
            return Err(QuickfireError::invalid_transition(
                "submit an answer",
                self.state.phase,
            ));
        }
        self.submit_answer_at(self.state.current_index, answer, Utc::now())
    }

    /// Answer the item at `index`, at the given time.
    ///
    /// A second answer for the same index fails with `DuplicateAnswer` and
    /// leaves the state untouched, even after completion.
    pub fn submit_answer_at(
        &mut self,
        index: usize,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome> {
        if self.state.answer_for(index).is_some() {
            tracing::debug!(session = %self.state.id, index, "ignoring repeated answer");
            return Err(QuickfireError::DuplicateAnswer { index });
        }
        if self.state.phase != Phase::InProgress {
            return Err(QuickfireError::invalid_transition(
                "submit an answer",
                self.state.phase,
            ));
        }
        if index != self.state.current_index {
            return Err(QuickfireError::invalid_transition(
                format!(
                    "answer item {} while item {} is current",
                    index, self.state.current_index
                ),
                self.state.phase,
            ));
        }

        let item = &self.state.items[index];
        let correct = score(item, answer);
        let item_id = item.id.clone();
        let expected = item.answer.clone();

        self.state.answers.push(AnswerRecord {
            index,
            item_id: item_id.clone(),
            submitted: answer.to_string(),
            correct,
            answered_at: now,
        });
        self.state.current_index += 1;
        self.state.add_trace(
            EventType::AnswerRecorded,
            now,
            Some(format!("{}: {}", item_id, if correct { "correct" } else { "incorrect" })),
        );

        if let Some(sink) = &self.sink {
            sink.submit(ResultRecord::new(&self.state.id, &item_id, correct, now));
        }

        if self.state.current_index == self.state.total_items() {
            self.complete(CompletionReason::AllAnswered, now);
        }

        Ok(AnswerOutcome {
            index,
            correct,
            expected,
            completed: self.state.phase == Phase::Completed,
        })
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Result<Phase> {
        self.tick_at(Utc::now())
    }

    /// Advance the countdown by one second, at the given time.
    ///
    /// Ticks that arrive after completion are ignored.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Result<Phase> {
        match self.state.phase {
            Phase::Completed => Ok(Phase::Completed),
            Phase::NotStarted => Err(QuickfireError::invalid_transition(
                "tick",
                Phase::NotStarted,
            )),
            Phase::InProgress => {
                let Some(remaining) = self.state.remaining_seconds else {
                    return Err(QuickfireError::invalid_transition(
                        "tick an untimed session",
                        Phase::InProgress,
                    ));
                };

                let remaining = remaining.saturating_sub(1);
                self.state.remaining_seconds = Some(remaining);
                if remaining == 0 {
                    self.state.add_trace(EventType::TimedOut, now, None);
                    self.complete(CompletionReason::TimedOut, now);
                }
                Ok(self.state.phase)
            }
        }
    }

    /// Transition: InProgress → Completed, keeping the answers so far.
    pub fn abandon(&mut self) -> Result<()> {
        self.abandon_at(Utc::now())
    }

    /// Abandon at the given time. Abandoning a completed session is a no-op.
    pub fn abandon_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.state.phase {
            Phase::Completed => Ok(()),
            Phase::NotStarted => Err(QuickfireError::invalid_transition(
                "abandon",
                Phase::NotStarted,
            )),
            Phase::InProgress => {
                self.state.add_trace(
                    EventType::Abandoned,
                    now,
                    Some(format!("at item {}", self.state.current_index)),
                );
                self.complete(CompletionReason::Abandoned, now);
                Ok(())
            }
        }
    }

    /// Transition: Completed → NotStarted with a fresh selection.
    pub fn restart(&mut self) -> Result<()> {
        self.restart_at(Utc::now())
    }

    /// Restart at the given time.
    ///
    /// The state is untouched if reading the source fails.
    pub fn restart_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state.phase != Phase::Completed {
            return Err(QuickfireError::invalid_transition(
                "restart",
                self.state.phase,
            ));
        }

        let items =
            self.selector
                .select(self.source.as_ref(), &self.config, now, &mut self.rng)?;

        let previous = std::mem::replace(&mut self.state, SessionState::new(items));
        self.state.remaining_seconds = self.config.time_limit_seconds;
        self.state.add_trace(
            EventType::ItemsSelected,
            now,
            Some(format!("restart of {}", previous.id)),
        );

        tracing::debug!(
            previous = %previous.id,
            session = %self.state.id,
            items = self.state.total_items(),
            "session restarted"
        );
        Ok(())
    }

    /// Summary of the session, once it has completed.
    pub fn summary(&self) -> Option<SessionSummary> {
        if self.state.phase != Phase::Completed {
            return None;
        }
        Some(SessionSummary::build(&self.state, &self.config, Utc::now()))
    }

    fn complete(&mut self, reason: CompletionReason, now: DateTime<Utc>) {
        self.state.phase = Phase::Completed;
        self.state.completed_at = Some(now);
        self.state.completion = Some(reason);
        self.state.add_trace(EventType::Completed, now, None);

        tracing::debug!(
            session = %self.state.id,
            ?reason,
            answered = self.state.answered_count(),
            correct = self.state.correct_count(),
            "session completed"
        );
    }
}

impl std::fmt::Debug for ChallengeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeEngine")
            .field("config", &self.config)
            .field("selector", &self.selector)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
