//! SQLite storage implementation.
//!
//! Holds listings, the feedback corpus, and run bookkeeping in one file-based
//! database. Timestamps are RFC 3339 strings in UTC.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{EvalError, Result};
use crate::traits::store::ScoreStore;
use crate::types::{FeedbackExample, Listing, ScoreUpdate, Vote};

/// Status recorded when a run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    /// Some listings were loaded before the run failed.
    Partial,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// Counters tracked on a run record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub listings_found: i64,
    pub listings_scored: i64,
    pub listings_passed: i64,
}

/// SQLite-backed listing, feedback, and run store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(EvalError::storage)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    ///
    /// Limited to one connection: each connection to `:memory:` is its own
    /// database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(EvalError::storage)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                id INTEGER PRIMARY KEY,
                url TEXT NOT NULL UNIQUE,
                source TEXT,
                address TEXT,
                address_normalized TEXT,
                price INTEGER,
                beds INTEGER,
                baths REAL,
                property_type TEXT,
                available_date TEXT,
                photos TEXT,
                description TEXT,
                room_scores TEXT,
                avg_score REAL,
                listing_pass INTEGER,
                llm_reasoning TEXT,
                date_found TEXT,
                scored_at TEXT,
                emailed_at TEXT,
                reviewed_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feedback (
                id INTEGER PRIMARY KEY,
                listing_id INTEGER REFERENCES listings(id),
                vote TEXT,
                categories TEXT,
                reason TEXT,
                created_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_feedback_listing_id ON feedback(listing_id)")
            .execute(&self.pool)
            .await
            .map_err(EvalError::storage)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY,
                started_at TEXT,
                completed_at TEXT,
                search_criteria TEXT,
                listings_found INTEGER,
                listings_crawled INTEGER,
                listings_scored INTEGER,
                listings_passed INTEGER,
                listings_emailed INTEGER,
                crawl_failures INTEGER,
                status TEXT,
                error TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a listing, or return the id of the one already stored under
    /// the same URL.
    pub async fn insert_listing(&self, listing: &Listing) -> Result<i64> {
        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM listings WHERE url = ?")
            .bind(&listing.url)
            .fetch_optional(&self.pool)
            .await
            .map_err(EvalError::storage)?;
        if let Some((id,)) = existing {
            return Ok(id);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO listings (
                url, source, address, address_normalized, price, beds, baths,
                property_type, available_date, photos, description, date_found
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&listing.url)
        .bind(&listing.source)
        .bind(&listing.address)
        .bind(&listing.address_normalized)
        .bind(listing.price)
        .bind(listing.beds)
        .bind(listing.baths)
        .bind(&listing.property_type)
        .bind(&listing.available_date)
        .bind(&listing.photos)
        .bind(&listing.description)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_listing(&self, listing_id: i64) -> Result<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?"
        ))
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        Ok(row.map(Listing::from))
    }

    /// Listings never scored, oldest first.
    pub async fn unscored_listings(&self) -> Result<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE scored_at IS NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        Ok(rows.into_iter().map(Listing::from).collect())
    }

    /// Ids of listings that already have at least one feedback entry.
    pub async fn listing_ids_with_feedback(&self) -> Result<HashSet<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT DISTINCT listing_id FROM feedback WHERE listing_id IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Record a judgement. Categories are stored as a JSON array; an empty
    /// list is stored as NULL.
    pub async fn insert_feedback(
        &self,
        listing_id: i64,
        vote: Vote,
        categories: &[String],
        reason: Option<&str>,
    ) -> Result<i64> {
        let categories = if categories.is_empty() {
            None
        } else {
            Some(serde_json::to_string(categories)?)
        };
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());

        let result = sqlx::query(
            "INSERT INTO feedback (listing_id, vote, categories, reason, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(listing_id)
        .bind(vote.as_str())
        .bind(categories)
        .bind(reason)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        let feedback_id = result.last_insert_rowid();
        info!(feedback_id, listing_id, vote = %vote, "Feedback saved");
        Ok(feedback_id)
    }

    /// Start a run record with zeroed counters.
    pub async fn create_run(&self, search_criteria: &str) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO runs (
                started_at, search_criteria, listings_found, listings_crawled,
                listings_scored, listings_passed, listings_emailed, crawl_failures, status
            )
            VALUES (?, ?, 0, 0, 0, 0, 0, 0, ?)
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(search_criteria)
        .bind(RunStatus::Running.as_str())
        .execute(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn update_run_counts(&self, run_id: i64, counts: &RunCounts) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE runs
            SET listings_found = ?, listings_crawled = ?, listings_scored = ?, listings_passed = ?
            WHERE id = ?
            "#,
        )
        .bind(counts.listings_found)
        .bind(counts.listings_found)
        .bind(counts.listings_scored)
        .bind(counts.listings_passed)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        Ok(())
    }

    pub async fn complete_run(
        &self,
        run_id: i64,
        status: RunStatus,
        error: Option<&str>,
    ) -> Result<()> {
        sqlx::query("UPDATE runs SET completed_at = ?, status = ?, error = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(status.as_str())
            .bind(error)
            .bind(run_id)
            .execute(&self.pool)
            .await
            .map_err(EvalError::storage)?;

        Ok(())
    }
}

const LISTING_COLUMNS: &str = "id, url, source, address, address_normalized, price, beds, baths, \
     property_type, available_date, photos, description, room_scores, avg_score, listing_pass, \
     llm_reasoning";

// Row types for sqlx queries
#[derive(Debug, FromRow)]
struct ListingRow {
    id: i64,
    url: String,
    source: Option<String>,
    address: Option<String>,
    address_normalized: Option<String>,
    price: Option<i64>,
    beds: Option<i64>,
    baths: Option<f64>,
    property_type: Option<String>,
    available_date: Option<String>,
    photos: Option<String>,
    description: Option<String>,
    room_scores: Option<String>,
    avg_score: Option<f64>,
    listing_pass: Option<i64>,
    llm_reasoning: Option<String>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Listing {
            id: row.id,
            url: row.url,
            source: row.source,
            address: row.address,
            address_normalized: row.address_normalized,
            price: row.price,
            beds: row.beds,
            baths: row.baths,
            property_type: row.property_type,
            available_date: row.available_date,
            photos: row.photos,
            description: row.description,
            room_scores: row.room_scores,
            avg_score: row.avg_score,
            listing_pass: row.listing_pass,
            llm_reasoning: row.llm_reasoning,
        }
    }
}

#[derive(Debug, FromRow)]
struct FeedbackRow {
    vote: Option<String>,
    categories: Option<String>,
    reason: Option<String>,
    room_scores: Option<String>,
    address: Option<String>,
}

#[async_trait]
impl ScoreStore for SqliteStore {
    async fn feedback_count(&self) -> Result<usize> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feedback")
            .fetch_one(&self.pool)
            .await
            .map_err(EvalError::storage)?;

        Ok(count.0 as usize)
    }

    async fn recent_feedback(&self, limit: usize) -> Result<Vec<FeedbackExample>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT f.vote, f.categories, f.reason, l.room_scores, l.address
            FROM feedback f
            JOIN listings l ON f.listing_id = l.id
            ORDER BY f.created_at DESC, f.id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let Some(vote) = row.vote.as_deref().and_then(Vote::parse) else {
                    warn!(vote = ?row.vote, "Ignoring feedback with unknown vote");
                    return None;
                };
                Some(FeedbackExample {
                    vote,
                    categories: row.categories,
                    reason: row.reason,
                    room_scores: row.room_scores,
                    address: row.address,
                })
            })
            .collect())
    }

    async fn update_listing_scores(&self, listing_id: i64, update: &ScoreUpdate) -> Result<()> {
        let room_scores = update.room_scores_json()?;

        sqlx::query(
            r#"
            UPDATE listings
            SET room_scores = ?, avg_score = ?, listing_pass = ?, llm_reasoning = ?, scored_at = ?
            WHERE id = ?
            "#,
        )
        .bind(room_scores)
        .bind(update.avg_score)
        .bind(i64::from(update.listing_pass))
        .bind(&update.reasoning)
        .bind(Utc::now().to_rfc3339())
        .bind(listing_id)
        .execute(&self.pool)
        .await
        .map_err(EvalError::storage)?;

        Ok(())
    }
}
