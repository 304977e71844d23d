use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::criteria::SearchCriteria;

#[derive(Parser)]
#[command(name = "house-finder")]
#[command(about = "Score rental listings from their photos and learn from your feedback")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score listings with the vision model
    Score(ScoreArgs),

    /// Record a yes/no judgement on a listing
    Feedback(FeedbackArgs),
}

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["from_file", "unscored"])))]
pub struct ScoreArgs {
    /// Load listings from a JSON file (inserted into the database)
    #[arg(long, value_name = "PATH")]
    pub from_file: Option<PathBuf>,

    /// Score listings already in the database that were never scored
    #[arg(long)]
    pub unscored: bool,

    #[command(flatten)]
    pub criteria: SearchCriteria,

    /// Stop once this many listings have passed
    #[arg(long, default_value_t = 5)]
    pub max_score: usize,

    /// Use feedback for scoring even with fewer than 10 feedback entries
    #[arg(long)]
    pub no_cold_start: bool,

    /// Load and filter only; skip scoring
    #[arg(long)]
    pub dry_run: bool,

    /// Listings scored concurrently
    #[arg(long, default_value_t = 3)]
    pub workers: usize,

    /// Per-listing time limit in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}

#[derive(Args)]
pub struct FeedbackArgs {
    #[arg(long)]
    pub listing_id: i64,

    /// yes or no
    #[arg(long)]
    pub vote: String,

    /// Reason category; repeat for several (e.g. "Too dark")
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,

    /// Free-text comment
    #[arg(long)]
    pub reason: Option<String>,
}
