//! Unified error types for Quickfire.
//!
//! Session errors split into two groups. Recoverable ones (an empty deck, a
//! repeated answer, a failed persistence write) are handled locally: the
//! caller shows a placeholder, ignores the call, or logs and moves on.
//! Invalid transitions are wiring bugs and are meant to surface loudly.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::Phase;

/// The main error type for Quickfire operations.
#[derive(Error, Debug)]
pub enum QuickfireError {
    /// I/O errors from deck, history or config files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading or validation errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// A card failed validation at the source boundary.
    #[error("invalid card: {message}")]
    InvalidCard { message: String },

    /// The session has no items to play.
    #[error("no cards available for this session")]
    EmptySource,

    /// An answer was submitted for an index that already has one.
    #[error("item {index} has already been answered")]
    DuplicateAnswer { index: usize },

    /// A persistence write failed.
    #[error("failed to record result for {item_id}: {message}")]
    PersistenceWrite { item_id: String, message: String },

    /// An engine method was called in the wrong phase.
    #[error("invalid transition: cannot {action} while {phase}")]
    InvalidTransition { action: String, phase: Phase },
}

/// A specialized Result type for Quickfire operations.
pub type Result<T> = std::result::Result<T, QuickfireError>;

impl QuickfireError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid card error.
    pub fn invalid_card(message: impl Into<String>) -> Self {
        Self::InvalidCard {
            message: message.into(),
        }
    }

    /// Create a persistence write error.
    pub fn persistence(item_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PersistenceWrite {
            item_id: item_id.into(),
            message: message.into(),
        }
    }

    /// Create an invalid transition error.
    pub fn invalid_transition(action: impl Into<String>, phase: Phase) -> Self {
        Self::InvalidTransition {
            action: action.into(),
            phase,
        }
    }

    /// Check if the caller can recover from this error locally.
    ///
    /// Invalid transitions are programming errors and return false.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidTransition { .. })
    }
}

impl From<io::Error> for QuickfireError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for QuickfireError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Log the error and continue with a safe value. Used where a failure must
/// never interrupt a running session.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the CLI.
pub mod exit_codes {
    /// Command finished, including "no cards available".
    pub const SUCCESS: i32 = 0;

    /// Command failed with an error.
    pub const ERROR: i32 = 1;
}
