//! Quickfire - timed flashcard challenge sessions
//!
//! Quickfire picks a small set of review items from a deck, runs them as a
//! timed or untimed challenge, scores each answer, and writes the results
//! back to the deck without making the learner wait.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod stats;
pub mod storage;
pub mod util;

pub use config::Config;
pub use core::{
    normalize_cards, AnswerOutcome, ChallengeEngine, CompletionReason, EngineBuilder, Phase,
    RawCard, ReviewItem, SelectionMode, SessionConfig, SessionSelector, SessionState, TickTimer,
};
pub use error::{FailOpen, QuickfireError, Result};
pub use stats::{score, HistoryLog, HistoryStats, SessionRecord, SessionSummary, Tally};
pub use storage::{
    BackgroundRecorder, CardSource, FileCardStore, MemoryCardStore, PersistenceAdapter,
    ResultRecord, ResultSink,
};

// CLI commands
pub use cli::{CardsCommand, HistoryCommand, InitCommand, PlayCommand, SelectCommand};
