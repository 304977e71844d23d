//! In-memory storage implementation for testing and dry runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::traits::store::ScoreStore;
use crate::types::{FeedbackExample, ScoreUpdate};

/// In-memory feedback corpus and verdict log.
///
/// Verdicts are kept in the order they were written, so tests can assert a
/// listing was persisted exactly once.
#[derive(Default)]
pub struct MemoryStore {
    /// Oldest first.
    feedback: RwLock<Vec<FeedbackExample>>,
    updates: RwLock<Vec<(i64, ScoreUpdate)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the feedback corpus, oldest first.
    pub fn with_feedback(self, feedback: impl IntoIterator<Item = FeedbackExample>) -> Self {
        self.feedback.write().unwrap().extend(feedback);
        self
    }

    pub fn add_feedback(&self, example: FeedbackExample) {
        self.feedback.write().unwrap().push(example);
    }

    /// Every verdict written, in write order.
    pub fn updates(&self) -> Vec<(i64, ScoreUpdate)> {
        self.updates.read().unwrap().clone()
    }

    /// The latest verdict for a listing.
    pub fn update_for(&self, listing_id: i64) -> Option<ScoreUpdate> {
        self.updates
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _)| *id == listing_id)
            .map(|(_, update)| update.clone())
    }

    /// How many times each listing was written.
    pub fn write_counts(&self) -> HashMap<i64, usize> {
        let mut counts = HashMap::new();
        for (id, _) in self.updates.read().unwrap().iter() {
            *counts.entry(*id).or_insert(0) += 1;
        }
        counts
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    async fn feedback_count(&self) -> Result<usize> {
        Ok(self.feedback.read().unwrap().len())
    }

    async fn recent_feedback(&self, limit: usize) -> Result<Vec<FeedbackExample>> {
        Ok(self
            .feedback
            .read()
            .unwrap()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_listing_scores(&self, listing_id: i64, update: &ScoreUpdate) -> Result<()> {
        self.updates
            .write()
            .unwrap()
            .push((listing_id, update.clone()));
        Ok(())
    }
}
