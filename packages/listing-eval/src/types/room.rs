//! Per-room scores and the verdicts built from them.

use serde::{Deserialize, Deserializer, Serialize};

/// Minimum score for a room to count as passing.
pub const PASS_SCORE: i64 = 7;

/// A vision model's score for one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomScore {
    /// Room label: `living_room`, `bedroom_N`, or anything else the model emits
    pub room: String,

    /// 1-10
    #[serde(deserialize_with = "integer_score")]
    pub score: i64,

    #[serde(default)]
    pub reasoning: String,

    /// 1-based index among the photos actually sent to the model
    #[serde(
        default,
        deserialize_with = "lenient_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_index: Option<i64>,

    /// Filled in from `photo_index` after the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    /// `score >= 7`, set by the rule evaluator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<bool>,
}

impl RoomScore {
    pub fn new(room: impl Into<String>, score: i64) -> Self {
        Self {
            room: room.into(),
            score,
            reasoning: String::new(),
            photo_index: None,
            photo_url: None,
            pass: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn with_photo_index(mut self, index: i64) -> Self {
        self.photo_index = Some(index);
        self
    }

    pub fn is_living_room(&self) -> bool {
        self.room == "living_room"
    }

    pub fn is_bedroom(&self) -> bool {
        self.room.starts_with("bedroom")
    }

    /// Living rooms and bedrooms count toward the verdict; other labels are
    /// displayed only.
    pub fn is_scored(&self) -> bool {
        self.is_living_room() || self.is_bedroom()
    }
}

/// Lowest and highest score a room can get.
pub const SCORE_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

/// Models occasionally answer `7.5`; round rather than reject the entry.
/// Anything outside 1-10 after rounding is rejected.
fn integer_score<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Number::deserialize(deserializer)?;
    let rounded = match value.as_i64() {
        Some(i) => i as f64,
        None => value
            .as_f64()
            .map(f64::round)
            .ok_or_else(|| serde::de::Error::custom("score is not a number"))?,
    };
    if rounded < *SCORE_RANGE.start() as f64 || rounded > *SCORE_RANGE.end() as f64 {
        return Err(serde::de::Error::custom(format!("score {value} outside 1-10")));
    }
    Ok(rounded as i64)
}

/// Anything but a whole number leaves the room without a photo.
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64()))
}

/// Pass-2 preference decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalVerdict {
    pub pass: bool,
    pub reasoning: String,
}

/// The verdict persisted for a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreUpdate {
    pub room_scores: Vec<RoomScore>,
    pub avg_score: f64,
    pub listing_pass: bool,
    pub reasoning: String,
}

impl ScoreUpdate {
    /// A verdict for a listing that never reached rule evaluation.
    pub fn skipped(reasoning: impl Into<String>) -> Self {
        Self {
            room_scores: Vec::new(),
            avg_score: 0.0,
            listing_pass: false,
            reasoning: reasoning.into(),
        }
    }

    /// Room scores serialized the way they are stored on the listing.
    pub fn room_scores_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.room_scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_classification() {
        assert!(RoomScore::new("living_room", 8).is_living_room());
        assert!(RoomScore::new("bedroom_2", 8).is_bedroom());
        assert!(RoomScore::new("bedroom", 8).is_scored());
        assert!(!RoomScore::new("kitchen", 8).is_scored());
        assert!(!RoomScore::new("Living Room", 8).is_scored());
    }

    #[test]
    fn test_fractional_score_rounds() {
        let room: RoomScore =
            serde_json::from_str(r#"{"room": "bedroom_1", "score": 7.6, "reasoning": "bright"}"#)
                .unwrap();
        assert_eq!(room.score, 8);
        assert_eq!(room.photo_index, None);
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        for score in ["0", "11", "-3", "42", "9223372036854775807", "1e300", "10.6"] {
            let json = format!(r#"{{"room": "living_room", "score": {score}}}"#);
            assert!(
                serde_json::from_str::<RoomScore>(&json).is_err(),
                "score {score} should be rejected"
            );
        }
        let edge: RoomScore =
            serde_json::from_str(r#"{"room": "living_room", "score": 0.5}"#).unwrap();
        assert_eq!(edge.score, 1);
    }

    #[test]
    fn test_non_integer_photo_index_ignored() {
        let room: RoomScore =
            serde_json::from_str(r#"{"room": "bedroom_1", "score": 7, "photo_index": "2"}"#).unwrap();
        assert_eq!(room.photo_index, None);
    }

    #[test]
    fn test_serialization_omits_unset_fields() {
        let json = serde_json::to_string(&RoomScore::new("living_room", 9)).unwrap();
        assert_eq!(json, r#"{"room":"living_room","score":9,"reasoning":""}"#);
    }
}
