//! `house-finder feedback`: record a judgement on a scored listing.

use anyhow::{Context, Result};
use colored::Colorize;
use listing_eval::{SqliteStore, Vote};
use tracing::warn;

use crate::cli::FeedbackArgs;
use crate::config::Config;

/// Reasons offered for a "no" vote.
pub const CATEGORIES: &[&str] = &[
    "Too dark",
    "Bad view",
    "Windows face wall",
    "No windows",
    "Too small",
    "Bad layout",
    "Looks dated / run down",
    "Poor kitchen",
    "Bad neighborhood feel",
    "Overpriced",
];

pub async fn run(config: &Config, args: FeedbackArgs) -> Result<()> {
    let vote = Vote::parse(&args.vote)
        .with_context(|| format!("Invalid vote '{}'. Use 'yes' or 'no'.", args.vote))?;

    let store = SqliteStore::open(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    let listing = store
        .get_listing(args.listing_id)
        .await?
        .with_context(|| format!("Listing {} not found", args.listing_id))?;

    let categories = normalize_categories(&args.categories);
    for unknown in categories.iter().filter(|c| !CATEGORIES.contains(&c.as_str())) {
        warn!(category = %unknown, "Recording category outside the standard list");
    }

    store
        .insert_feedback(listing.id, vote, &categories, args.reason.as_deref())
        .await?;

    let verdict = match vote {
        Vote::Yes => "YES".green(),
        Vote::No => "NO".red(),
    };
    println!(
        "Feedback recorded: {} for {}",
        verdict.bold(),
        listing.display_name()
    );
    Ok(())
}

/// Trim, drop blanks, and match standard categories case-insensitively.
fn normalize_categories(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| {
            CATEGORIES
                .iter()
                .find(|known| known.eq_ignore_ascii_case(c))
                .map_or_else(|| c.to_string(), |known| known.to_string())
        })
        .collect()
}
