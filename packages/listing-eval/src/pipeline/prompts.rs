//! Prompts for the two scoring passes.

use std::fmt::Write;

use crate::types::{FeedbackExample, RoomScore, Vote};

const ROOM_SCORING_PROMPT: &str = "\
You are evaluating a rental listing's rooms. Analyze all photos and:
1. Identify which photos show bedrooms and which show the living room
2. Score each bedroom and the living room from 1-10 based on:
   - Window presence and size
   - Natural light visible in the photo
   - View quality (not facing a wall, alley, or obstruction)

Photos are labeled Photo 1, Photo 2, etc. in the order shown above.
Now evaluate this listing's photos.

For each identified bedroom and living room, return a JSON array with objects containing:
- \"room\": room label (living_room, bedroom_1, bedroom_2, etc.)
- \"photo_index\": the 1-based number of the photo that best shows this room
- \"score\": integer 1-10
- \"reasoning\": one-sentence explanation

If no bedrooms or living room can be identified in the photos, return an empty array [].

Return ONLY the JSON array, no other text.";

/// Pass 1: objective room scoring. No feedback goes in here.
pub fn build_room_scoring_prompt() -> String {
    ROOM_SCORING_PROMPT.to_string()
}

/// Pass 2: does this apartment match what the user has liked before?
pub fn build_preference_prompt(room_scores: &[RoomScore], feedback: &[FeedbackExample]) -> String {
    let mut scores_text = String::new();
    for room in room_scores {
        let _ = writeln!(
            scores_text,
            "- {}: {}/10 - {}",
            room.room, room.score, room.reasoning
        );
    }

    let mut feedback_text = String::new();
    for (vote, header) in [(Vote::Yes, "LIKED"), (Vote::No, "DISLIKED")] {
        let group: Vec<&FeedbackExample> = feedback.iter().filter(|ex| ex.vote == vote).collect();
        if group.is_empty() {
            continue;
        }
        let _ = write!(feedback_text, "\n{header}:\n");
        for example in group {
            feedback_text.push_str(&format_feedback_line(example));
            feedback_text.push('\n');
        }
    }

    format!(
        "You are evaluating whether a rental apartment matches the user's preferences.\n\n\
         Here are the room scores from an objective evaluation:\n\
         {scores_text}\n\
         The photos of each scored room are shown above (labeled by room name).\n\n\
         Here are examples of apartments the user has evaluated:\n\
         {feedback_text}\n\
         Based on the user's preferences shown above, would they like this apartment?\n\
         Return JSON: {{\"pass\": true/false, \"reasoning\": \"one-sentence explanation\"}}\n\n\
         Return ONLY the JSON object, no other text."
    )
}

/// `- {address} ({scores}){detail}`
fn format_feedback_line(example: &FeedbackExample) -> String {
    let address = example.address.as_deref().unwrap_or("Unknown");
    let scores = format_feedback_scores(example.room_scores.as_deref());

    let categories = example.category_list().join(", ");
    let reason = example.reason.as_deref().unwrap_or("");
    let parts: Vec<&str> = [categories.as_str(), reason]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    let detail = if parts.is_empty() {
        String::new()
    } else {
        format!(": {}", parts.join("; "))
    };

    format!("- {address} ({scores}){detail}")
}

/// Compact `room: score` pairs from stored room-score JSON.
fn format_feedback_scores(raw: Option<&str>) -> String {
    const NONE: &str = "no scores";

    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return NONE.to_string();
    };
    let Ok(serde_json::Value::Array(entries)) = serde_json::from_str::<serde_json::Value>(raw)
    else {
        return NONE.to_string();
    };

    let pairs: Vec<String> = entries
        .iter()
        .filter_map(|entry| {
            let room = entry.get("room")?;
            let score = entry.get("score")?;
            Some(format!("{}: {}", json_display(room), json_display(score)))
        })
        .collect();

    if pairs.is_empty() {
        NONE.to_string()
    } else {
        pairs.join(", ")
    }
}

/// Strings without quotes, everything else as JSON.
fn json_display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
