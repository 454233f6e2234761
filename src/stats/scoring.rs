//! Answer scoring and accuracy aggregation.
//!
//! Answers are compared by exact, case-sensitive string equality. There is
//! no trimming, normalization or partial credit: `"Paris "` does not match
//! `"Paris"`.

use crate::core::{AnswerRecord, ReviewItem};

/// Check whether a submitted answer is correct for an item.
pub fn score(item: &ReviewItem, submitted: &str) -> bool {
    submitted == item.answer
}

/// Running answered/correct counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Number of answers seen.
    pub answered: usize,
    /// Number of correct answers seen.
    pub correct: usize,
}

impl Tally {
    /// Create an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tally from recorded answers.
    pub fn from_answers(answers: &[AnswerRecord]) -> Self {
        let mut tally = Self::new();
        for answer in answers {
            tally.add(answer.correct);
        }
        tally
    }

    /// Count one answer.
    pub fn add(&mut self, correct: bool) {
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Number of incorrect answers.
    pub fn incorrect(&self) -> usize {
        self.answered - self.correct
    }

    /// Accuracy as a ratio in `[0, 1]`; 0 when nothing was answered.
    pub fn ratio(&self) -> f64 {
        if self.answered == 0 {
            return 0.0;
        }
        self.correct as f64 / self.answered as f64
    }

    /// Accuracy as a whole percentage, rounded half up; 0 when nothing was
    /// answered.
    pub fn percent(&self) -> u32 {
        if self.answered == 0 {
            return 0;
        }
        let correct = self.correct as u64;
        let answered = self.answered as u64;
        ((200 * correct + answered) / (2 * answered)) as u32
    }
}
