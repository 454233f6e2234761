//! CLI commands for Quickfire.
//!
//! - **Session commands**: play, select
//! - **Deck and history commands**: cards, history
//! - **Utility commands**: init

pub mod play;
pub mod select;

pub mod cards;
pub mod history;

pub mod init;

pub use cards::CardsCommand;
pub use history::HistoryCommand;
pub use init::InitCommand;
pub use play::{PlayCommand, PlayEvent};
pub use select::SelectCommand;

use crate::config::Config;
use crate::core::{SelectionMode, SessionConfig};
use crate::error::Result;

/// Session settings given on the command line.
///
/// Each field overrides the loaded config when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOverrides {
    pub mode: Option<String>,
    pub count: Option<usize>,
    /// Countdown in seconds; 0 forces an untimed session.
    pub time_limit: Option<u32>,
    /// Target accuracy; 0 disables the target.
    pub target: Option<u32>,
    /// Card ids for explicit selection.
    pub cards: Vec<String>,
}

impl SessionOverrides {
    /// Build the session config for a run.
    ///
    /// Card ids without an explicit `--mode` select explicit mode.
    pub fn apply(&self, config: &Config) -> Result<SessionConfig> {
        let mut session = config.to_session_config()?;

        if let Some(mode) = &self.mode {
            session.mode = mode.parse()?;
        } else if !self.cards.is_empty() {
            session.mode = SelectionMode::ExplicitSelection;
        }
        if let Some(count) = self.count {
            session.target_count = count;
        }
        if let Some(limit) = self.time_limit {
            session.time_limit_seconds = (limit > 0).then_some(limit);
        }
        if let Some(target) = self.target {
            session.target_accuracy_percent = (target > 0).then_some(target);
        }
        session.explicit_candidates = self.cards.clone();

        session.validate()?;
        Ok(session)
    }
}
