//! Per-listing scoring: Pass 1, rules, optional Pass 2, cold-start override.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::gateway::{evaluate_preference, score_rooms};
use crate::pipeline::prompts::{build_preference_prompt, build_room_scoring_prompt};
use crate::pipeline::rules::evaluate_rooms;
use crate::traits::{store::ScoreStore, vision::VisionGateway};
use crate::types::{FeedbackExample, Listing, RoomScore, ScoreUpdate};

pub const COLD_START_REASONING: &str = "Cold start: passed without filtering";

/// Read-only state shared by every listing in a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchContext {
    /// Every listing that reaches rule evaluation passes.
    pub cold_start: bool,

    /// Feedback snapshot taken once at the start of the batch.
    pub feedback: Arc<Vec<FeedbackExample>>,
}

impl BatchContext {
    pub fn new(cold_start: bool, feedback: Vec<FeedbackExample>) -> Self {
        Self {
            cold_start,
            feedback: Arc::new(feedback),
        }
    }

    fn wants_preference_pass(&self) -> bool {
        !self.cold_start && !self.feedback.is_empty()
    }
}

/// How one listing ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    /// Passed, with score fields attached.
    Passed(Listing),

    /// Scored but failed the rules or the preference filter.
    Rejected { reasoning: String },

    /// Never reached rule evaluation.
    Skipped { reason: String },
}

impl ScoreOutcome {
    pub fn passed(&self) -> Option<&Listing> {
        match self {
            Self::Passed(listing) => Some(listing),
            _ => None,
        }
    }
}

/// Scores one listing at a time against a vision gateway and records the
/// verdict in a store.
#[derive(Clone)]
pub struct ListingScorer {
    gateway: Arc<dyn VisionGateway>,
    store: Arc<dyn ScoreStore>,
}

impl ListingScorer {
    pub fn new(gateway: Arc<dyn VisionGateway>, store: Arc<dyn ScoreStore>) -> Self {
        Self { gateway, store }
    }

    pub fn store(&self) -> &Arc<dyn ScoreStore> {
        &self.store
    }

    /// Score a listing. Exactly one verdict is persisted per call.
    ///
    /// Errors are store failures only; provider failures become a skipped
    /// outcome.
    pub async fn score(&self, listing: &Listing, ctx: &BatchContext) -> Result<ScoreOutcome> {
        let listing_id = listing.id;
        let photos = listing.photo_urls();
        if photos.is_empty() {
            info!(listing_id, "No photos, skipping");
            return self.skip(listing_id, "No photos").await;
        }

        // Pass 1
        let prompt = build_room_scoring_prompt();
        let (rooms, sent_urls) = match score_rooms(self.gateway.as_ref(), &photos, &prompt).await {
            Ok((Some(rooms), _)) if rooms.is_empty() => {
                info!(listing_id, "No rooms identified, skipping");
                return self.skip(listing_id, "No identifiable rooms").await;
            }
            Ok((Some(rooms), sent_urls)) => (rooms, sent_urls),
            Ok((None, _)) => {
                info!(listing_id, "No usable room scores, skipping");
                return self.skip(listing_id, "No usable vision model response").await;
            }
            Err(e) => {
                warn!(listing_id, provider = self.gateway.provider(), error = %e, "Vision model call failed, skipping");
                return self
                    .skip(listing_id, format!("Vision model call failed: {e}"))
                    .await;
            }
        };

        let rooms = attach_photo_urls(rooms, &sent_urls);
        let (rooms, rules) = evaluate_rooms(&rooms);
        debug!(listing_id, pass = rules.pass, avg_score = rules.avg_score, reasoning = %rules.reasoning, "Rules evaluated");

        if !rules.pass && !ctx.cold_start {
            info!(listing_id, reasoning = %rules.reasoning, "Failed hard criteria, skipping pass 2");
            let update = ScoreUpdate {
                room_scores: rooms,
                avg_score: rules.avg_score,
                listing_pass: false,
                reasoning: rules.reasoning.clone(),
            };
            self.store.update_listing_scores(listing_id, &update).await?;
            return Ok(ScoreOutcome::Rejected {
                reasoning: rules.reasoning,
            });
        }

        let mut listing_pass = rules.pass;
        let mut reasoning = rules.reasoning;

        // Pass 2
        if rules.pass && ctx.wants_preference_pass() {
            let room_photos: Vec<String> = rooms.iter().filter_map(|r| r.photo_url.clone()).collect();
            if room_photos.is_empty() {
                debug!(listing_id, "No room photos to show, skipping pass 2");
            } else {
                let prompt = build_preference_prompt(&rooms, &ctx.feedback);
                match evaluate_preference(self.gateway.as_ref(), &room_photos, &prompt).await {
                    Ok(Some(verdict)) if !verdict.pass => {
                        listing_pass = false;
                        reasoning = format!("Preference filter: {}", verdict.reasoning);
                        info!(listing_id, reasoning = %reasoning, "Failed preference filter");
                    }
                    Ok(Some(_)) => debug!(listing_id, "Passed preference filter"),
                    Ok(None) => {
                        warn!(listing_id, "No usable preference response, keeping pass 1 result")
                    }
                    Err(e) => {
                        warn!(listing_id, error = %e, "Preference evaluation failed, keeping pass 1 result")
                    }
                }
            }
        }

        if ctx.cold_start {
            listing_pass = true;
            reasoning = COLD_START_REASONING.to_string();
        }

        let update = ScoreUpdate {
            room_scores: rooms,
            avg_score: rules.avg_score,
            listing_pass,
            reasoning,
        };
        self.store.update_listing_scores(listing_id, &update).await?;

        if !update.listing_pass {
            return Ok(ScoreOutcome::Rejected {
                reasoning: update.reasoning,
            });
        }

        let mut passed = listing.clone();
        passed.room_scores = Some(update.room_scores_json()?);
        passed.avg_score = Some(update.avg_score);
        passed.listing_pass = Some(1);
        passed.llm_reasoning = Some(update.reasoning);
        Ok(ScoreOutcome::Passed(passed))
    }

    async fn skip(&self, listing_id: i64, reason: impl Into<String>) -> Result<ScoreOutcome> {
        let update = ScoreUpdate::skipped(reason);
        self.store.update_listing_scores(listing_id, &update).await?;
        Ok(ScoreOutcome::Skipped {
            reason: update.reasoning,
        })
    }
}

/// Resolve each room's `photo_index` against the photos actually sent.
fn attach_photo_urls(rooms: Vec<RoomScore>, sent_urls: &[String]) -> Vec<RoomScore> {
    rooms
        .into_iter()
        .map(|mut room| {
            room.photo_url = room
                .photo_index
                .and_then(|idx| usize::try_from(idx).ok())
                .filter(|idx| (1..=sent_urls.len()).contains(idx))
                .map(|idx| sent_urls[idx - 1].clone());
            room
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_photo_urls_bounds() {
        let sent = vec!["https://img/a.jpg".to_string(), "https://img/b.jpg".to_string()];
        let rooms = vec![
            RoomScore::new("living_room", 8).with_photo_index(2),
            RoomScore::new("bedroom_1", 8).with_photo_index(0),
            RoomScore::new("bedroom_2", 8).with_photo_index(3),
            RoomScore::new("bedroom_3", 8).with_photo_index(-1),
            RoomScore::new("bedroom_4", 8),
        ];

        let rooms = attach_photo_urls(rooms, &sent);
        assert_eq!(rooms[0].photo_url.as_deref(), Some("https://img/b.jpg"));
        assert!(rooms[1..].iter().all(|r| r.photo_url.is_none()));
    }

    #[test]
    fn test_preference_pass_gating() {
        let feedback = vec![FeedbackExample::new(crate::types::Vote::Yes)];
        assert!(BatchContext::new(false, feedback.clone()).wants_preference_pass());
        assert!(!BatchContext::new(true, feedback).wants_preference_pass());
        assert!(!BatchContext::new(false, vec![]).wants_preference_pass());
    }
}
