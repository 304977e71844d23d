//! Vision gateways, one per provider, plus the typed calls the scorer makes.
//!
//! - [`OpenAiGateway`] and [`AnthropicGateway`] pass photo URLs through;
//!   the provider fetches them.
//! - [`OpenRouterGateway`] downloads and inlines photos first, dropping any
//!   that fail (see [`images`]).
//!
//! All of them retry transient failures with [`retry::with_retries`].

pub mod anthropic;
#[cfg(test)]
pub(crate) mod http_stub;
pub mod images;
pub mod openai;
pub mod openrouter;
pub mod retry;

pub use anthropic::AnthropicGateway;
pub use openai::OpenAiGateway;
pub use openrouter::{OpenRouterGateway, DEFAULT_OPENROUTER_MODEL};

use ai_client::VisionError;
use tracing::warn;

use crate::pipeline::parse::{parse_eval_verdict, parse_room_scores, preview};
use crate::traits::vision::{RequestPurpose, VisionGateway, VisionRequest};
use crate::types::{EvalVerdict, RoomScore};

/// Pass 1 call: room scores (if any parsed) and the photos actually sent.
pub async fn score_rooms(
    gateway: &dyn VisionGateway,
    photo_urls: &[String],
    prompt: &str,
) -> Result<(Option<Vec<RoomScore>>, Vec<String>), VisionError> {
    let response = gateway
        .complete(VisionRequest::new(RequestPurpose::RoomScoring, photo_urls, prompt))
        .await?;

    let Some(text) = response.text else {
        return Ok((None, response.sent_urls));
    };

    let parsed = parse_room_scores(&text);
    if parsed.is_none() {
        warn!(
            provider = gateway.provider(),
            preview = %preview(&text, 200),
            "Failed to parse room scoring response"
        );
    }
    Ok((parsed, response.sent_urls))
}

/// Pass 2 call: the preference verdict, if one parsed.
pub async fn evaluate_preference(
    gateway: &dyn VisionGateway,
    room_photo_urls: &[String],
    prompt: &str,
) -> Result<Option<EvalVerdict>, VisionError> {
    let response = gateway
        .complete(VisionRequest::new(
            RequestPurpose::PreferenceEval,
            room_photo_urls,
            prompt,
        ))
        .await?;

    let Some(text) = response.text else {
        return Ok(None);
    };

    let parsed = parse_eval_verdict(&text);
    if parsed.is_none() {
        warn!(
            provider = gateway.provider(),
            preview = %preview(&text, 200),
            "Failed to parse preference evaluation response"
        );
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockGateway, MockReply};

    fn photos() -> Vec<String> {
        vec!["https://img/1.jpg".to_string(), "https://img/2.jpg".to_string()]
    }

    #[tokio::test]
    async fn test_score_rooms_parses_fenced_array() {
        let gateway = MockGateway::new().with_default(
            RequestPurpose::RoomScoring,
            MockReply::text("```json\n[{\"room\": \"living_room\", \"photo_index\": 2, \"score\": 8, \"reasoning\": \"bright\"}]\n```"),
        );

        let (rooms, sent) = score_rooms(&gateway, &photos(), "prompt").await.unwrap();
        let rooms = rooms.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].photo_index, Some(2));
        assert_eq!(sent, photos());
    }

    #[tokio::test]
    async fn test_score_rooms_unparseable_is_none() {
        let gateway = MockGateway::new().with_default(
            RequestPurpose::RoomScoring,
            MockReply::text("I could not see any rooms, sorry."),
        );

        let (rooms, sent) = score_rooms(&gateway, &photos(), "prompt").await.unwrap();
        assert!(rooms.is_none());
        assert_eq!(sent.len(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_is_none_not_error() {
        let gateway =
            MockGateway::new().with_default(RequestPurpose::PreferenceEval, MockReply::Exhausted);
        let verdict = evaluate_preference(&gateway, &photos(), "prompt").await.unwrap();
        assert!(verdict.is_none());
    }

    #[tokio::test]
    async fn test_non_transient_error_propagates() {
        let gateway = MockGateway::new().with_default(
            RequestPurpose::PreferenceEval,
            MockReply::Error(VisionError::Api {
                status: 400,
                message: "bad request".into(),
            }),
        );
        let result = evaluate_preference(&gateway, &photos(), "prompt").await;
        assert!(matches!(result, Err(VisionError::Api { status: 400, .. })));
    }
}
