//! Persistence trait consumed by the scorer.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{FeedbackExample, ScoreUpdate};

/// Store that holds the feedback corpus and receives verdicts.
///
/// Implementations must tolerate concurrent `update_listing_scores` calls
/// for different listings; the scorer never writes the same listing twice.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Total feedback entries recorded.
    async fn feedback_count(&self) -> Result<usize>;

    /// Up to `limit` most recent feedback entries, newest first.
    async fn recent_feedback(&self, limit: usize) -> Result<Vec<FeedbackExample>>;

    /// Record the verdict for a listing and mark it scored.
    async fn update_listing_scores(&self, listing_id: i64, update: &ScoreUpdate) -> Result<()>;
}
