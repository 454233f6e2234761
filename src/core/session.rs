//! Session configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QuickfireError, Result};

/// How the items of a session are picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Uniform random sample of the whole deck.
    #[default]
    RandomSample,
    /// Weak and never-reviewed items first.
    LowAccuracyFirst,
    /// Items not reviewed within the recency cutoff.
    NotRecentlySeen,
    /// Items picked by the learner.
    ExplicitSelection,
}

/// Valid spellings accepted by [`SelectionMode::from_str`].
pub const VALID_MODES: &[&str] = &["random", "low-accuracy", "not-recent", "explicit"];

impl SelectionMode {
    /// Stable snake_case name, used as the session type in history records.
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::RandomSample => "random_sample",
            SelectionMode::LowAccuracyFirst => "low_accuracy_first",
            SelectionMode::NotRecentlySeen => "not_recently_seen",
            SelectionMode::ExplicitSelection => "explicit_selection",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMode {
    type Err = QuickfireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "random" | "random_sample" => Ok(SelectionMode::RandomSample),
            "low_accuracy" | "low_accuracy_first" => Ok(SelectionMode::LowAccuracyFirst),
            "not_recent" | "not_recently_seen" => Ok(SelectionMode::NotRecentlySeen),
            "explicit" | "explicit_selection" => Ok(SelectionMode::ExplicitSelection),
            _ => Err(QuickfireError::config(format!(
                "unknown selection mode '{}', expected one of {:?}",
                s, VALID_MODES
            ))),
        }
    }
}

/// Options for one challenge session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Selection mode.
    pub mode: SelectionMode,
    /// Requested number of items.
    pub target_count: usize,
    /// Countdown length. `None` runs untimed.
    pub time_limit_seconds: Option<u32>,
    /// Accuracy needed to pass, in percent.
    pub target_accuracy_percent: Option<u32>,
    /// Item ids for explicit selection, in play order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explicit_candidates: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::RandomSample,
            target_count: 5,
            time_limit_seconds: None,
            target_accuracy_percent: None,
            explicit_candidates: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Create a config for the given mode and size.
    pub fn new(mode: SelectionMode, target_count: usize) -> Self {
        Self {
            mode,
            target_count,
            ..Default::default()
        }
    }

    /// Create an explicit-selection config over the given item ids.
    ///
    /// The target count is the number of candidates.
    pub fn explicit<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let explicit_candidates: Vec<String> = candidates.into_iter().map(Into::into).collect();
        Self {
            mode: SelectionMode::ExplicitSelection,
            target_count: explicit_candidates.len(),
            explicit_candidates,
            ..Default::default()
        }
    }

    /// Set a time limit.
    pub fn with_time_limit(mut self, seconds: u32) -> Self {
        self.time_limit_seconds = Some(seconds);
        self
    }

    /// Set a target accuracy.
    pub fn with_target_accuracy(mut self, percent: u32) -> Self {
        self.target_accuracy_percent = Some(percent);
        self
    }

    /// Whether the session runs against a countdown.
    pub fn is_timed(&self) -> bool {
        self.time_limit_seconds.is_some()
    }

    /// Target count after clamping explicit selections to the candidate list.
    pub fn effective_target_count(&self) -> usize {
        match self.mode {
            SelectionMode::ExplicitSelection => {
                self.target_count.min(self.explicit_candidates.len())
            }
            _ => self.target_count,
        }
    }

    /// Check the config invariants.
    pub fn validate(&self) -> Result<()> {
        if self.target_count == 0 {
            return Err(QuickfireError::config("target_count must be at least 1"));
        }
        if self.time_limit_seconds == Some(0) {
            return Err(QuickfireError::config(
                "time_limit_seconds must be at least 1 when set",
            ));
        }
        if let Some(target) = self.target_accuracy_percent {
            if target > 100 {
                return Err(QuickfireError::config(format!(
                    "target_accuracy_percent must be between 0 and 100, got {}",
                    target
                )));
            }
        }
        if self.mode == SelectionMode::ExplicitSelection && self.explicit_candidates.is_empty() {
            return Err(QuickfireError::config(
                "explicit selection requires at least one candidate",
            ));
        }
        Ok(())
    }
}
