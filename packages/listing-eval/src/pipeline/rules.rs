//! Deterministic pass/fail rules over Pass-1 room scores.
//!
//! Only `living_room` and `bedroom*` labels count. Checks run in a fixed order
//! and the first failing check supplies the reasoning:
//!
//! 1. at least one living room or bedroom
//! 2. a living room was identified
//! 3. the (first) living room scores at least 7
//! 4. no living room or bedroom below the floor of 4
//! 5. at least half the bedrooms score 7 or more
//! 6. the average is at least 7

use crate::types::{RoomScore, PASS_SCORE};

/// Any counted room below this fails the listing outright.
pub const FLOOR_SCORE: i64 = 4;

/// Outcome of [`evaluate_rooms`].
#[derive(Debug, Clone, PartialEq)]
pub struct RuleVerdict {
    pub pass: bool,
    pub avg_score: f64,
    pub reasoning: String,
}

impl RuleVerdict {
    fn fail(avg_score: f64, reasoning: impl Into<String>) -> Self {
        Self {
            pass: false,
            avg_score,
            reasoning: reasoning.into(),
        }
    }
}

/// Apply the rules, returning an annotated copy of the rooms and the verdict.
///
/// Every returned room has `pass` set to `score >= 7`, unscored labels
/// included. The input is left untouched.
pub fn evaluate_rooms(rooms: &[RoomScore]) -> (Vec<RoomScore>, RuleVerdict) {
    if !rooms.iter().any(RoomScore::is_scored) {
        return (rooms.to_vec(), RuleVerdict::fail(0.0, "No identifiable rooms"));
    }

    let annotated: Vec<RoomScore> = rooms
        .iter()
        .cloned()
        .map(|mut room| {
            room.pass = Some(room.score >= PASS_SCORE);
            room
        })
        .collect();

    let living: Vec<&RoomScore> = annotated.iter().filter(|r| r.is_living_room()).collect();
    let bedrooms: Vec<&RoomScore> = annotated.iter().filter(|r| r.is_bedroom()).collect();

    let counted = living.len() + bedrooms.len();
    let total: f64 = living.iter().chain(bedrooms.iter()).map(|r| r.score as f64).sum();
    let avg_score = total / counted as f64;

    let Some(first_living) = living.first() else {
        return (annotated, RuleVerdict::fail(avg_score, "No living room identified"));
    };

    if first_living.score < PASS_SCORE {
        let reasoning = format!("Living room score {} < {PASS_SCORE}", first_living.score);
        return (annotated, RuleVerdict::fail(avg_score, reasoning));
    }

    if let Some(low) = living
        .iter()
        .chain(bedrooms.iter())
        .find(|r| r.score < FLOOR_SCORE)
    {
        let reasoning = format!("{} score {} < {FLOOR_SCORE} (floor)", low.room, low.score);
        return (annotated, RuleVerdict::fail(avg_score, reasoning));
    }

    if !bedrooms.is_empty() {
        let passing = bedrooms.iter().filter(|r| r.score >= PASS_SCORE).count();
        if passing * 2 < bedrooms.len() {
            let reasoning = format!(
                "Only {passing}/{} bedrooms >= {PASS_SCORE} (need 50%)",
                bedrooms.len()
            );
            return (annotated, RuleVerdict::fail(avg_score, reasoning));
        }
    }

    if avg_score < PASS_SCORE as f64 {
        let reasoning = format!("Average score {avg_score:.1} < {PASS_SCORE}");
        return (annotated, RuleVerdict::fail(avg_score, reasoning));
    }

    let verdict = RuleVerdict {
        pass: true,
        avg_score,
        reasoning: "Passed all criteria".to_string(),
    };
    (annotated, verdict)
}
