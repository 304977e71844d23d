//! Data types shared across the evaluation pipeline.

pub mod config;
pub mod feedback;
pub mod listing;
pub mod room;

pub use config::{ProviderConfig, ProviderKind, ScoringConfig};
pub use feedback::{FeedbackExample, Vote};
pub use listing::Listing;
pub use room::{EvalVerdict, RoomScore, ScoreUpdate, PASS_SCORE};
