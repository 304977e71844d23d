//! `house-finder score`: load, filter, and score listings until enough pass.

use anyhow::{Context, Result};
use listing_eval::{
    score_listings, Listing, ListingScorer, RunCounts, RunStatus, ScoringConfig, SqliteStore,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::ScoreArgs;
use crate::config::Config;
use crate::summary::print_summary;

pub async fn run(config: &Config, args: ScoreArgs) -> Result<()> {
    // Provider problems are fatal before anything is loaded.
    let gateway = if args.dry_run {
        None
    } else {
        Some(config.provider()?.build_gateway()?)
    };

    let store = Arc::new(
        SqliteStore::open(&config.database_path)
            .await
            .with_context(|| format!("Failed to open database {}", config.database_path.display()))?,
    );

    let criteria = serde_json::to_string(&args.criteria)?;
    let run_id = store.create_run(&criteria).await?;
    let mut counts = RunCounts::default();

    let result = async {
        let listings = load_listings(&store, &args).await?;
        counts.listings_found = listings.len() as i64;
        store.update_run_counts(run_id, &counts).await?;

        let listings = args.criteria.filter(listings);
        let listings = skip_reviewed(&store, listings).await?;

        let Some(gateway) = gateway else {
            info!("Dry run: skipping scoring");
            return Ok(listings);
        };

        let scorer = ListingScorer::new(gateway, store.clone());
        let scoring = ScoringConfig::default()
            .with_workers(args.workers)
            .with_per_listing_timeout(Duration::from_secs(args.timeout_secs))
            .with_force_feedback(args.no_cold_start);

        let (passed, scored) = score_until(&scorer, listings, args.max_score, &scoring).await?;
        counts.listings_scored = scored as i64;
        counts.listings_passed = passed.len() as i64;
        store.update_run_counts(run_id, &counts).await?;
        Ok::<_, anyhow::Error>(passed)
    }
    .await;

    match result {
        Ok(listings) => {
            store.complete_run(run_id, RunStatus::Completed, None).await?;
            print_summary(&listings, &counts);
            Ok(())
        }
        Err(e) => {
            let status = if counts.listings_found > 0 {
                RunStatus::Partial
            } else {
                RunStatus::Failed
            };
            store
                .complete_run(run_id, status, Some(&format!("{e:#}")))
                .await?;
            print_summary(&[], &counts);
            Err(e)
        }
    }
}

async fn load_listings(store: &SqliteStore, args: &ScoreArgs) -> Result<Vec<Listing>> {
    let Some(path) = &args.from_file else {
        let listings = store.unscored_listings().await?;
        info!(count = listings.len(), "Loaded unscored listings from database");
        return Ok(listings);
    };

    let mut listings = read_listing_file(path).await?;
    for listing in &mut listings {
        listing.id = store.insert_listing(listing).await?;
    }
    info!(count = listings.len(), path = %path.display(), "Loaded listings from file");
    Ok(listings)
}

async fn read_listing_file(path: &Path) -> Result<Vec<Listing>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("File not found: {}", path.display()))?;
    parse_listings(&raw).with_context(|| format!("Invalid listing file: {}", path.display()))
}

/// A JSON array of listing objects, or a single object. Entries without a
/// URL are ignored.
fn parse_listings(raw: &str) -> Result<Vec<Listing>> {
    let items = match serde_json::from_str::<Value>(raw)? {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut listings = Vec::with_capacity(items.len());
    for item in items {
        let has_url = item
            .get("url")
            .and_then(Value::as_str)
            .is_some_and(|url| !url.is_empty());
        if !has_url {
            continue;
        }
        match serde_json::from_value::<Listing>(item) {
            Ok(listing) => listings.push(listing),
            Err(e) => warn!(error = %e, "Skipping malformed listing"),
        }
    }
    Ok(listings)
}

async fn skip_reviewed(store: &SqliteStore, listings: Vec<Listing>) -> Result<Vec<Listing>> {
    let reviewed = store.listing_ids_with_feedback().await?;
    let before = listings.len();
    let remaining: Vec<Listing> = listings
        .into_iter()
        .filter(|l| !reviewed.contains(&l.id))
        .collect();
    if remaining.len() < before {
        info!(
            skipped = before - remaining.len(),
            remaining = remaining.len(),
            "Skipped listings with existing feedback"
        );
    }
    Ok(remaining)
}

/// Score in batches sized to the shortfall until `target` listings have
/// passed or the pool runs dry. Returns the passed listings (at most
/// `target`) and how many were sent for scoring.
async fn score_until(
    scorer: &ListingScorer,
    listings: Vec<Listing>,
    target: usize,
    config: &ScoringConfig,
) -> Result<(Vec<Listing>, usize)> {
    let pool_size = listings.len();
    let mut pool = listings.into_iter();
    let mut passed = Vec::new();
    let mut scored = 0;

    info!(target, pool_size, "Scoring listings");
    while passed.len() < target {
        let batch: Vec<Listing> = pool.by_ref().take(target - passed.len()).collect();
        if batch.is_empty() {
            break;
        }
        scored += batch.len();
        info!(
            batch = batch.len(),
            passed = passed.len(),
            target,
            remaining = pool_size - scored,
            "Scoring batch"
        );

        let report = score_listings(scorer, batch, config).await?;
        passed.extend(report.passed);
    }

    passed.truncate(target);
    Ok((passed, scored))
}
