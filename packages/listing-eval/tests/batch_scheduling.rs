//! Batch scheduler behaviour: bounded concurrency and per-listing isolation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use listing_eval::{
    score_listings, EvalError, FeedbackExample, Listing, ListingScorer, MemoryStore, MockGateway,
    MockReply, RequestPurpose, ScoreStore, ScoreUpdate, ScoringConfig,
};

const PASSING_ROOMS: &str = r#"[
  {"room": "living_room", "photo_index": 1, "score": 9, "reasoning": "Bright"},
  {"room": "bedroom_1", "photo_index": 1, "score": 8, "reasoning": "Bright"}
]"#;

fn listing(id: i64) -> Listing {
    Listing::new(id, format!("https://rentals.example.com/{id}"))
        .with_photos([first_photo(id)])
}

fn first_photo(id: i64) -> String {
    format!("https://img.example.com/{id}.jpg")
}

fn passed_ids(listings: &[Listing]) -> Vec<i64> {
    let mut ids: Vec<i64> = listings.iter().map(|l| l.id).collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_concurrency_bounded_by_workers() {
    let gateway = Arc::new(MockGateway::new().with_default(
        RequestPurpose::RoomScoring,
        MockReply::delayed(Duration::from_millis(40), MockReply::text(PASSING_ROOMS)),
    ));
    let store = Arc::new(MemoryStore::new());
    let scorer = ListingScorer::new(gateway.clone(), store.clone());
    let config = ScoringConfig::default().with_workers(2);

    let report = score_listings(&scorer, (1..=6).map(listing).collect(), &config)
        .await
        .unwrap();

    assert_eq!(passed_ids(&report.passed), vec![1, 2, 3, 4, 5, 6]);
    assert!(gateway.max_in_flight() <= 2, "max in flight: {}", gateway.max_in_flight());
    assert_eq!(gateway.calls().len(), 6);
}

#[tokio::test]
async fn test_timeout_excludes_only_slow_listing() {
    let gateway = Arc::new(
        MockGateway::new()
            .with_default(RequestPurpose::RoomScoring, MockReply::text(PASSING_ROOMS))
            .with_reply(
                RequestPurpose::RoomScoring,
                first_photo(2),
                MockReply::delayed(Duration::from_secs(30), MockReply::text(PASSING_ROOMS)),
            ),
    );
    let store = Arc::new(MemoryStore::new());
    let scorer = ListingScorer::new(gateway, store.clone());
    let config = ScoringConfig::default().with_per_listing_timeout(Duration::from_millis(200));

    let started = std::time::Instant::now();
    let report = score_listings(&scorer, (1..=3).map(listing).collect(), &config)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.timed_out, vec![2]);
    assert_eq!(passed_ids(&report.passed), vec![1, 3]);
    assert!(store.update_for(2).is_none());
}

#[tokio::test]
async fn test_panic_excludes_only_that_listing() {
    let gateway = Arc::new(
        MockGateway::new()
            .with_default(RequestPurpose::RoomScoring, MockReply::text(PASSING_ROOMS))
            .with_reply(RequestPurpose::RoomScoring, first_photo(2), MockReply::Panic),
    );
    let store = Arc::new(MemoryStore::new());
    let scorer = ListingScorer::new(gateway, store);

    let report = score_listings(&scorer, (1..=3).map(listing).collect(), &ScoringConfig::default())
        .await
        .unwrap();

    assert_eq!(report.failed, vec![2]);
    assert_eq!(passed_ids(&report.passed), vec![1, 3]);
}

/// Store whose writes fail for one listing.
struct FlakyStore {
    inner: MemoryStore,
    broken_listing: i64,
}

#[async_trait]
impl ScoreStore for FlakyStore {
    async fn feedback_count(&self) -> listing_eval::Result<usize> {
        self.inner.feedback_count().await
    }

    async fn recent_feedback(&self, limit: usize) -> listing_eval::Result<Vec<FeedbackExample>> {
        self.inner.recent_feedback(limit).await
    }

    async fn update_listing_scores(&self, listing_id: i64, update: &ScoreUpdate) -> listing_eval::Result<()> {
        if listing_id == self.broken_listing {
            return Err(EvalError::Storage("disk I/O error".into()));
        }
        self.inner.update_listing_scores(listing_id, update).await
    }
}

#[tokio::test]
async fn test_store_error_excludes_only_that_listing() {
    let gateway = Arc::new(
        MockGateway::new().with_default(RequestPurpose::RoomScoring, MockReply::text(PASSING_ROOMS)),
    );
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        broken_listing: 3,
    });
    let scorer = ListingScorer::new(gateway, store);

    let report = score_listings(&scorer, (1..=4).map(listing).collect(), &ScoringConfig::default())
        .await
        .unwrap();

    assert_eq!(report.failed, vec![3]);
    assert_eq!(passed_ids(&report.passed), vec![1, 2, 4]);
    assert_eq!(report.scored(), 3);
}

/// Store that can't serve the feedback snapshot.
struct NoFeedbackStore;

#[async_trait]
impl ScoreStore for NoFeedbackStore {
    async fn feedback_count(&self) -> listing_eval::Result<usize> {
        Err(EvalError::Storage("database is locked".into()))
    }

    async fn recent_feedback(&self, _limit: usize) -> listing_eval::Result<Vec<FeedbackExample>> {
        Ok(vec![])
    }

    async fn update_listing_scores(&self, _listing_id: i64, _update: &ScoreUpdate) -> listing_eval::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_feedback_snapshot_failure_aborts_batch() {
    let gateway = Arc::new(MockGateway::new());
    let scorer = ListingScorer::new(gateway.clone(), Arc::new(NoFeedbackStore));

    let result = score_listings(&scorer, vec![listing(1)], &ScoringConfig::default()).await;

    assert!(matches!(result, Err(EvalError::Storage(_))));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_empty_batch() {
    let scorer = ListingScorer::new(Arc::new(MockGateway::new()), Arc::new(MemoryStore::new()));
    let report = score_listings(&scorer, vec![], &ScoringConfig::default()).await.unwrap();
    assert_eq!(report.scored(), 0);
    assert!(report.cold_start);
}
