//! Cards command for Quickfire.
//!
//! Lists the cards in a deck with their review statistics.

use serde::{Deserialize, Serialize};

use crate::core::ReviewItem;
use crate::storage::CardSource;

/// Options for the cards command.
#[derive(Debug, Clone, Default)]
pub struct CardsOptions {
    /// Output as JSON.
    pub json: bool,
}

/// One card for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardRow {
    pub id: String,
    pub prompt: String,
    pub times_reviewed: u32,
    pub times_correct: u32,
    /// Rounded accuracy; absent for cards never reviewed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_percent: Option<u32>,
    /// Last review (ISO 8601).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<String>,
}

impl From<&ReviewItem> for CardRow {
    fn from(item: &ReviewItem) -> Self {
        Self {
            id: item.id.clone(),
            prompt: item.prompt.clone(),
            times_reviewed: item.times_reviewed,
            times_correct: item.times_correct,
            accuracy_percent: item.accuracy_percent().map(|p| p.round() as u32),
            last_reviewed_at: item.last_reviewed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Output format for the cards command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardsOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub cards: Vec<CardRow>,
    pub count: usize,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CardsOutput {
    /// Create a successful output.
    pub fn success(cards: Vec<CardRow>) -> Self {
        let count = cards.len();
        Self {
            success: true,
            cards,
            count,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            cards: vec![],
            count: 0,
            error: Some(error.into()),
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        if !self.success {
            return format!(
                "Cards failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }

        if self.cards.is_empty() {
            return "No cards available.".to_string();
        }

        let mut lines = vec![format!("Cards ({} found):", self.count)];
        lines.push(String::new());
        lines.push(format!(
            "{:<16}  {:>8}  {:>8}  {:<10}  {}",
            "ID", "REVIEWED", "ACCURACY", "LAST SEEN", "PROMPT"
        ));
        lines.push("-".repeat(72));

        for card in &self.cards {
            let accuracy = card
                .accuracy_percent
                .map(|p| format!("{}%", p))
                .unwrap_or_else(|| "-".to_string());
            let last_seen: String = card
                .last_reviewed_at
                .as_deref()
                .map(|t| t.chars().take(10).collect())
                .unwrap_or_else(|| "never".to_string());
            lines.push(format!(
                "{:<16}  {:>8}  {:>8}  {:<10}  {}",
                card.id, card.times_reviewed, accuracy, last_seen, card.prompt
            ));
        }

        lines.join("\n")
    }
}

/// The cards command implementation.
pub struct CardsCommand<S: CardSource> {
    source: S,
}

impl<S: CardSource> CardsCommand<S> {
    /// Create a new cards command.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Run the cards command.
    pub fn run(&self, _options: &CardsOptions) -> CardsOutput {
        match self.source.list_items() {
            Ok(items) => CardsOutput::success(items.iter().map(CardRow::from).collect()),
            Err(e) => CardsOutput::failure(format!("Failed to read deck: {}", e)),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &CardsOutput, options: &CardsOptions) -> String {
        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            output.format_text()
        }
    }
}
