//! Core types and logic for Quickfire.
//!
//! This module contains the review item model, session configuration and
//! selection, and the challenge engine state machine.

pub mod card;
pub mod engine;
pub mod selector;
pub mod session;
pub mod state;
pub mod timer;

pub use card::{normalize_cards, RawCard, ReviewItem};
pub use engine::{AnswerOutcome, ChallengeEngine, EngineBuilder};
pub use selector::SessionSelector;
pub use session::{SelectionMode, SessionConfig, VALID_MODES};
pub use state::{AnswerRecord, CompletionReason, EventType, Phase, SessionState, TraceEvent};
pub use timer::TickTimer;
