//! Bounded concurrent scoring of a batch of listings.
//!
//! Each listing runs in its own spawned task under a wall-clock timeout. At
//! most `workers` tasks are in flight; a timeout, error, or panic in one task
//! only excludes that listing.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::error::{EvalError, Result};
use crate::pipeline::score::{BatchContext, ListingScorer, ScoreOutcome};
use crate::types::{Listing, ScoringConfig};

/// Why a listing produced no outcome.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Failed(#[from] EvalError),

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Result of scoring one listing.
#[derive(Debug)]
pub struct TaskResult {
    pub listing_id: i64,
    pub outcome: std::result::Result<ScoreOutcome, TaskError>,
}

/// Everything a batch produced.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Passing listings, in completion order.
    pub passed: Vec<Listing>,
    pub rejected: usize,
    pub skipped: usize,
    pub timed_out: Vec<i64>,
    pub failed: Vec<i64>,

    /// Whether the batch ran under the cold-start override.
    pub cold_start: bool,
}

impl BatchReport {
    /// Listings that reached a persisted verdict.
    pub fn scored(&self) -> usize {
        self.passed.len() + self.rejected + self.skipped
    }

    fn record(&mut self, result: TaskResult) {
        let listing_id = result.listing_id;
        match result.outcome {
            Ok(ScoreOutcome::Passed(listing)) => self.passed.push(listing),
            Ok(ScoreOutcome::Rejected { .. }) => self.rejected += 1,
            Ok(ScoreOutcome::Skipped { .. }) => self.skipped += 1,
            Err(TaskError::TimedOut(after)) => {
                warn!(listing_id, timeout_secs = after.as_secs_f64(), "Listing timed out, skipping");
                self.timed_out.push(listing_id);
            }
            Err(e) => {
                error!(listing_id, error = %e, "Unexpected error scoring listing, skipping");
                self.failed.push(listing_id);
            }
        }
    }
}

/// Score `listings` with at most `config.workers` in flight.
///
/// The feedback snapshot is read once up front; failing to read it is the
/// only error this returns.
pub async fn score_listings(
    scorer: &ListingScorer,
    listings: Vec<Listing>,
    config: &ScoringConfig,
) -> Result<BatchReport> {
    let store = scorer.store();
    let feedback_count = store.feedback_count().await?;
    let cold_start = config.is_cold_start(feedback_count);
    let feedback = store.recent_feedback(config.feedback_limit).await?;
    info!(
        feedback_count,
        cold_start,
        force_feedback = config.force_feedback,
        examples = feedback.len(),
        "Loaded feedback snapshot"
    );

    let ctx = BatchContext::new(cold_start, feedback);
    let total = listings.len();
    let timeout = config.per_listing_timeout;

    let mut results = stream::iter(listings)
        .map(|listing| run_one(scorer.clone(), ctx.clone(), listing, timeout))
        .buffer_unordered(config.workers.max(1));

    let mut report = BatchReport {
        cold_start,
        ..Default::default()
    };
    while let Some(result) = results.next().await {
        report.record(result);
    }

    info!(
        total,
        passed = report.passed.len(),
        rejected = report.rejected,
        skipped = report.skipped,
        timed_out = report.timed_out.len(),
        failed = report.failed.len(),
        "Batch scored"
    );
    Ok(report)
}

async fn run_one(
    scorer: ListingScorer,
    ctx: BatchContext,
    listing: Listing,
    timeout: Duration,
) -> TaskResult {
    let listing_id = listing.id;
    let mut handle = tokio::spawn(async move { scorer.score(&listing, &ctx).await });

    let outcome = match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(Ok(outcome))) => Ok(outcome),
        Ok(Ok(Err(e))) => Err(TaskError::Failed(e)),
        Ok(Err(join_error)) => Err(TaskError::Panicked(join_error.to_string())),
        Err(_) => {
            handle.abort();
            Err(TaskError::TimedOut(timeout))
        }
    };

    TaskResult {
        listing_id,
        outcome,
    }
}
