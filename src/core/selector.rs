//! Item selection for challenge sessions.
//!
//! The selector turns a card source and a session config into the fixed,
//! ordered list of items one session plays through. Randomness comes from
//! the caller's RNG so selections are reproducible under a seed.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::SelectionConfig;
use crate::core::card::ReviewItem;
use crate::core::session::{SelectionMode, SessionConfig};
use crate::error::Result;
use crate::storage::CardSource;

/// Builds session item lists.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSelector {
    /// Items with accuracy below this percentage count as weak.
    accuracy_threshold_percent: f64,
    /// Items reviewed within this window count as recently seen.
    recent_cutoff: Duration,
}

impl Default for SessionSelector {
    fn default() -> Self {
        Self::from_config(&SelectionConfig::default())
    }
}

impl SessionSelector {
    /// Create a selector with explicit thresholds.
    pub fn new(accuracy_threshold_percent: f64, recent_cutoff: Duration) -> Self {
        Self {
            accuracy_threshold_percent,
            recent_cutoff,
        }
    }

    /// Create a selector from the `[selection]` config section.
    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(
            config.accuracy_threshold_percent as f64,
            Duration::hours(config.recent_cutoff_hours as i64),
        )
    }

    /// Read the source and select items for a session.
    ///
    /// An empty source gives an empty list; the caller decides that the
    /// session cannot start.
    pub fn select<R: Rng + ?Sized>(
        &self,
        source: &dyn CardSource,
        config: &SessionConfig,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Vec<ReviewItem>> {
        let items = source.list_items()?;
        Ok(self.select_from(items, config, now, rng))
    }

    /// Select from an already loaded item list.
    pub fn select_from<R: Rng + ?Sized>(
        &self,
        items: Vec<ReviewItem>,
        config: &SessionConfig,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<ReviewItem> {
        let target = config.effective_target_count();
        if items.is_empty() || target == 0 {
            return Vec::new();
        }

        let selected = match config.mode {
            SelectionMode::RandomSample => random_sample(items, target, rng),
            SelectionMode::LowAccuracyFirst => self.low_accuracy_first(items, target, rng),
            SelectionMode::NotRecentlySeen => self.not_recently_seen(items, target, now, rng),
            SelectionMode::ExplicitSelection => {
                explicit_selection(items, &config.explicit_candidates, target)
            }
        };

        tracing::debug!(
            mode = %config.mode,
            requested = target,
            selected = selected.len(),
            "selected session items"
        );

        selected
    }

    /// Whether an item counts as weak for low-accuracy selection.
    ///
    /// Never-reviewed items are always weak.
    pub fn is_weak(&self, item: &ReviewItem) -> bool {
        match item.accuracy_percent() {
            None => true,
            Some(accuracy) => accuracy < self.accuracy_threshold_percent,
        }
    }

    /// Whether an item was last reviewed before the recency cutoff.
    ///
    /// A cutoff earlier than the representable date range leaves only
    /// never-reviewed items stale.
    pub fn is_stale(&self, item: &ReviewItem, now: DateTime<Utc>) -> bool {
        match item.last_reviewed_at {
            None => true,
            Some(at) => now
                .checked_sub_signed(self.recent_cutoff)
                .is_some_and(|cutoff| at < cutoff),
        }
    }

    fn low_accuracy_first<R: Rng + ?Sized>(
        &self,
        items: Vec<ReviewItem>,
        target: usize,
        rng: &mut R,
    ) -> Vec<ReviewItem> {
        let (weak, mut rest): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|item| self.is_weak(item));

        let mut selected: Vec<ReviewItem> = weak.into_iter().take(target).collect();
        if selected.len() < target {
            rest.shuffle(rng);
            selected.extend(rest.into_iter().take(target - selected.len()));
        }
        selected
    }

    fn not_recently_seen<R: Rng + ?Sized>(
        &self,
        items: Vec<ReviewItem>,
        target: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<ReviewItem> {
        let stale_count = items.iter().filter(|item| self.is_stale(item, now)).count();

        if stale_count < target {
            // Not enough stale items: the whole pool is fair game.
            return random_sample(items, target, rng);
        }

        items
            .into_iter()
            .filter(|item| self.is_stale(item, now))
            .take(target)
            .collect()
    }
}

fn random_sample<R: Rng + ?Sized>(
    mut items: Vec<ReviewItem>,
    target: usize,
    rng: &mut R,
) -> Vec<ReviewItem> {
    items.shuffle(rng);
    items.truncate(target);
    items
}

fn explicit_selection(
    items: Vec<ReviewItem>,
    candidates: &[String],
    target: usize,
) -> Vec<ReviewItem> {
    let mut by_id: HashMap<String, ReviewItem> = items
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();

    let mut selected = Vec::with_capacity(target);
    for id in candidates {
        if selected.len() == target {
            break;
        }
        match by_id.remove(id) {
            Some(item) => selected.push(item),
            None => tracing::warn!(card = %id, "selected card not found in source, skipping"),
        }
    }
    selected
}
