//! Select command for Quickfire.
//!
//! Shows which cards a session would use without starting it.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::core::{SessionConfig, SessionSelector};
use crate::storage::CardSource;

/// Options for the select command.
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    /// Output as JSON.
    pub json: bool,
    /// Seed for reproducible selection.
    pub seed: Option<u64>,
}

/// One selected card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedCard {
    pub id: String,
    pub prompt: String,
}

/// Output format for the select command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// Selection mode used.
    pub mode: String,
    pub cards: Vec<SelectedCard>,
    pub count: usize,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SelectOutput {
    /// Create a successful output.
    pub fn success(mode: impl Into<String>, cards: Vec<SelectedCard>) -> Self {
        let count = cards.len();
        Self {
            success: true,
            mode: mode.into(),
            cards,
            count,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(mode: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            mode: mode.into(),
            cards: vec![],
            count: 0,
            error: Some(error.into()),
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        if !self.success {
            return format!(
                "Select failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }

        if self.cards.is_empty() {
            return "No cards available.".to_string();
        }

        let mut lines = vec![format!("Selected {} cards ({}):", self.count, self.mode)];
        for (i, card) in self.cards.iter().enumerate() {
            lines.push(format!("  {:>2}. [{}] {}", i + 1, card.id, card.prompt));
        }
        lines.join("\n")
    }
}

/// The select command implementation.
pub struct SelectCommand<S: CardSource> {
    source: S,
    selector: SessionSelector,
}

impl<S: CardSource> SelectCommand<S> {
    /// Create a new select command.
    pub fn new(source: S, selector: SessionSelector) -> Self {
        Self { source, selector }
    }

    /// Run the select command.
    pub fn run(&self, session: &SessionConfig, options: &SelectOptions) -> SelectOutput {
        self.run_at(session, options, Utc::now())
    }

    /// Run the select command with recency measured from `now`.
    pub fn run_at(
        &self,
        session: &SessionConfig,
        options: &SelectOptions,
        now: DateTime<Utc>,
    ) -> SelectOutput {
        let mode = session.mode.as_str();
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        match self.selector.select(&self.source, session, now, &mut rng) {
            Ok(items) => SelectOutput::success(
                mode,
                items
                    .into_iter()
                    .map(|item| SelectedCard {
                        id: item.id,
                        prompt: item.prompt,
                    })
                    .collect(),
            ),
            Err(e) => SelectOutput::failure(mode, format!("Failed to select cards: {}", e)),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &SelectOutput, options: &SelectOptions) -> String {
        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            output.format_text()
        }
    }
}
