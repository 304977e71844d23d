//! The two-pass evaluation pipeline.
//!
//! ```text
//! listings ─► batch ─► score ─► Pass 1 ─► parse ─► rules ─► Pass 2? ─► cold start? ─► store
//! ```

pub mod batch;
pub mod parse;
pub mod prompts;
pub mod rules;
pub mod score;

pub use batch::{score_listings, BatchReport, TaskError, TaskResult};
pub use rules::{evaluate_rooms, RuleVerdict};
pub use score::{BatchContext, ListingScorer, ScoreOutcome};
