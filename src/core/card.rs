//! Review items and their normalization at the card source boundary.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{QuickfireError, Result};

/// A single prompt/answer pair with its review history.
///
/// Items are snapshots: a running session never changes them. Review stats
/// are updated only by a persistence adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewItem {
    /// Identifier, unique within a card source.
    pub id: String,
    /// Text shown to the learner.
    pub prompt: String,
    /// Expected answer.
    pub answer: String,
    /// How many times the item was answered.
    pub times_reviewed: u32,
    /// How many of those answers were correct.
    pub times_correct: u32,
    /// When the item was last answered.
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewItem {
    /// Create a never-reviewed item.
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            answer: answer.into(),
            times_reviewed: 0,
            times_correct: 0,
            last_reviewed_at: None,
        }
    }

    /// Set review stats. `times_correct` is capped at `times_reviewed`.
    pub fn with_stats(mut self, times_reviewed: u32, times_correct: u32) -> Self {
        self.times_reviewed = times_reviewed;
        self.times_correct = times_correct.min(times_reviewed);
        self
    }

    /// Set the last review timestamp.
    pub fn with_last_reviewed(mut self, at: DateTime<Utc>) -> Self {
        self.last_reviewed_at = Some(at);
        self
    }

    /// Whether the item has never been answered.
    pub fn is_new(&self) -> bool {
        self.times_reviewed == 0
    }

    /// Historical accuracy in percent, or `None` if never reviewed.
    pub fn accuracy_percent(&self) -> Option<f64> {
        if self.times_reviewed == 0 {
            return None;
        }
        Some(100.0 * self.times_correct as f64 / self.times_reviewed as f64)
    }

    /// Apply one answer to the review stats.
    pub fn record(&mut self, was_correct: bool, at: DateTime<Utc>) {
        self.times_reviewed = self.times_reviewed.saturating_add(1);
        if was_correct {
            self.times_correct = self.times_correct.saturating_add(1);
        }
        self.last_reviewed_at = Some(at);
    }
}

/// A card as it appears in deck files.
///
/// Accepts the `front_content`/`back_content` column names of exported
/// flashcard tables and nullable counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawCard {
    pub id: String,
    #[serde(alias = "front_content")]
    pub prompt: String,
    #[serde(alias = "back_content")]
    pub answer: String,
    #[serde(default)]
    pub times_reviewed: Option<u32>,
    #[serde(default)]
    pub times_correct: Option<u32>,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawCard> for ReviewItem {
    type Error = QuickfireError;

    fn try_from(raw: RawCard) -> Result<Self> {
        let id = raw.id.trim().to_string();
        if id.is_empty() {
            return Err(QuickfireError::invalid_card("card id must not be empty"));
        }

        let times_reviewed = raw.times_reviewed.unwrap_or(0);
        let mut times_correct = raw.times_correct.unwrap_or(0);
        if times_correct > times_reviewed {
            tracing::warn!(
                card = %id,
                times_correct,
                times_reviewed,
                "times_correct exceeds times_reviewed, clamping"
            );
            times_correct = times_reviewed;
        }

        Ok(Self {
            id,
            prompt: raw.prompt,
            answer: raw.answer,
            times_reviewed,
            times_correct,
            last_reviewed_at: raw.last_reviewed_at,
        })
    }
}

impl From<&ReviewItem> for RawCard {
    fn from(item: &ReviewItem) -> Self {
        Self {
            id: item.id.clone(),
            prompt: item.prompt.clone(),
            answer: item.answer.clone(),
            times_reviewed: Some(item.times_reviewed),
            times_correct: Some(item.times_correct),
            last_reviewed_at: item.last_reviewed_at,
        }
    }
}

/// Normalize a batch of raw cards into review items.
///
/// Invalid cards fail the whole batch. Repeated ids keep the first card.
pub fn normalize_cards(raw: Vec<RawCard>) -> Result<Vec<ReviewItem>> {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(raw.len());

    for card in raw {
        let item = ReviewItem::try_from(card)?;
        if !seen.insert(item.id.clone()) {
            tracing::warn!(card = %item.id, "duplicate card id, keeping the first occurrence");
            continue;
        }
        items.push(item);
    }

    Ok(items)
}
