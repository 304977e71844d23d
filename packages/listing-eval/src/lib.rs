//! Two-Pass Rental Listing Evaluation
//!
//! Scores rental listings from their photos with a vision-capable LLM, then
//! personalises the result with accumulated like/dislike feedback.
//!
//! # Pipeline
//!
//! 1. **Pass 1**: the model identifies the living room and bedrooms and scores
//!    each 1-10 on windows, natural light, and view.
//! 2. **Rules**: deterministic thresholds decide pass/fail from those scores.
//! 3. **Pass 2**: a listing that passed the rules is shown to the model again
//!    alongside recent feedback, once enough feedback exists.
//! 4. **Cold start**: while feedback is scarce, everything that reaches rule
//!    evaluation passes so the user has listings to judge.
//!
//! Every listing gets exactly one persisted verdict.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use listing_eval::{score_listings, ListingScorer, MemoryStore, ProviderConfig, ScoringConfig};
//!
//! let gateway = ProviderConfig::from_env()?.build_gateway()?;
//! let store = Arc::new(MemoryStore::new());
//! let scorer = ListingScorer::new(gateway, store);
//!
//! let report = score_listings(&scorer, listings, &ScoringConfig::default()).await?;
//! for listing in &report.passed {
//!     println!("{} {:?}", listing.display_name(), listing.avg_score);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Vision gateway and score store abstractions
//! - [`types`] - Listings, room scores, feedback, configuration
//! - [`gateway`] - Provider gateways, image inlining, retry policy
//! - [`pipeline`] - Prompts, parsers, rules, scorer, batch scheduler
//! - [`stores`] - Storage implementations (MemoryStore, SqliteStore)
//! - [`testing`] - Mock gateway for testing

pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use ai_client::VisionError;
pub use error::{EvalError, Result};
pub use traits::{
    store::ScoreStore,
    vision::{RequestPurpose, VisionGateway, VisionRequest, VisionResponse},
};
pub use types::{
    config::{ProviderConfig, ProviderKind, ScoringConfig},
    feedback::{FeedbackExample, Vote},
    listing::Listing,
    room::{EvalVerdict, RoomScore, ScoreUpdate, PASS_SCORE},
};

pub use gateway::{
    evaluate_preference, retry::RetryPolicy, score_rooms, AnthropicGateway, OpenAiGateway,
    OpenRouterGateway,
};

pub use pipeline::{
    evaluate_rooms, score_listings, BatchContext, BatchReport, ListingScorer, RuleVerdict,
    ScoreOutcome, TaskError, TaskResult,
};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "sqlite")]
pub use stores::{RunCounts, RunStatus, SqliteStore};

// Re-export testing utilities
pub use testing::{MockGateway, MockReply};
