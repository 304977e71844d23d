//! Anthropic gateway: photos sent as URL image sources, or inline when a
//! listing already carries them as `data:` URLs.

use ai_client::{AnthropicClient, AnthropicMessage, AnthropicPart, MessagesRequest, VisionError};
use async_trait::async_trait;
use std::time::Duration;

use super::retry::{with_retries, RetryPolicy};
use crate::traits::vision::{VisionGateway, VisionRequest, VisionResponse};

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5-20250514";

pub struct AnthropicGateway {
    client: AnthropicClient,
    model: String,
    retry: RetryPolicy,
}

impl AnthropicGateway {
    pub fn new(api_key: &str, request_timeout: Duration) -> Self {
        Self {
            client: AnthropicClient::new(api_key).with_timeout(request_timeout),
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_request(&self, request: &VisionRequest<'_>) -> MessagesRequest {
        let mut parts = Vec::with_capacity(request.photo_urls.len() * 2 + 1);
        for (i, url) in request.photo_urls.iter().enumerate() {
            parts.push(AnthropicPart::text(request.purpose.photo_label(i + 1)));
            parts.push(AnthropicPart::image(url));
        }
        parts.push(AnthropicPart::text(request.prompt));

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: request.purpose.max_tokens(),
            messages: vec![AnthropicMessage::user(parts)],
        }
    }
}

#[async_trait]
impl VisionGateway for AnthropicGateway {
    fn provider(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: VisionRequest<'_>) -> Result<VisionResponse, VisionError> {
        let message = self.build_request(&request);

        let text = with_retries(&self.retry, self.provider(), || {
            let message = message.clone();
            async move { self.client.create_message(message).await }
        })
        .await?;

        Ok(VisionResponse {
            text,
            sent_urls: request.photo_urls.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::vision::RequestPurpose;

    #[test]
    fn test_build_request_labels_room_photos() {
        let gateway = AnthropicGateway::new("key", Duration::from_secs(1));
        let photos = vec!["https://img/a.jpg".to_string()];
        let request = gateway.build_request(&VisionRequest::new(
            RequestPurpose::PreferenceEval,
            &photos,
            "would they like it?",
        ));

        assert_eq!(request.max_tokens, 1024);
        assert_eq!(request.model, DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(
            request.messages[0].content,
            vec![
                AnthropicPart::text("Room photo 1:"),
                AnthropicPart::image_url("https://img/a.jpg"),
                AnthropicPart::text("would they like it?"),
            ]
        );
    }

    #[test]
    fn test_build_request_inlines_data_urls() {
        let gateway = AnthropicGateway::new("key", Duration::from_secs(1));
        let photos = vec![
            "https://img/a.jpg".to_string(),
            "data:image/webp;base64,UklGRg==".to_string(),
        ];
        let request =
            gateway.build_request(&VisionRequest::new(RequestPurpose::RoomScoring, &photos, "score"));

        assert_eq!(
            request.messages[0].content[3],
            AnthropicPart::image_base64("image/webp", "UklGRg==")
        );
        assert_eq!(request.messages[0].content[1], AnthropicPart::image_url("https://img/a.jpg"));
    }
}
