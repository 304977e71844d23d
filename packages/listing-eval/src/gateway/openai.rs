//! OpenAI gateway: photos sent as direct image URLs.

use ai_client::{ChatClient, ChatRequest, ContentPart, Message, VisionError};
use async_trait::async_trait;
use std::time::Duration;

use super::retry::{with_retries, RetryPolicy};
use crate::traits::vision::{RequestPurpose, VisionGateway, VisionRequest, VisionResponse};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Caption each photo, then append the prompt.
pub(crate) fn chat_parts<'a>(
    purpose: RequestPurpose,
    image_urls: impl IntoIterator<Item = &'a str>,
    prompt: &str,
) -> Vec<ContentPart> {
    let mut parts = Vec::new();
    for (i, url) in image_urls.into_iter().enumerate() {
        parts.push(ContentPart::text(purpose.photo_label(i + 1)));
        parts.push(ContentPart::image_url(url));
    }
    parts.push(ContentPart::text(prompt));
    parts
}

pub struct OpenAiGateway {
    client: ChatClient,
    model: String,
    retry: RetryPolicy,
}

impl OpenAiGateway {
    pub fn new(api_key: &str, request_timeout: Duration) -> Self {
        Self {
            client: ChatClient::new(api_key).with_timeout(request_timeout),
            model: DEFAULT_OPENAI_MODEL.to_string(),
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
}

#[async_trait]
impl VisionGateway for OpenAiGateway {
    fn provider(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: VisionRequest<'_>) -> Result<VisionResponse, VisionError> {
        let parts = chat_parts(
            request.purpose,
            request.photo_urls.iter().map(String::as_str),
            request.prompt,
        );
        let chat = ChatRequest::new(&self.model)
            .max_tokens(request.purpose.max_tokens())
            .message(Message::user(parts));

        let text = with_retries(&self.retry, self.provider(), || {
            let chat = chat.clone();
            async move { self.client.chat_completion(chat).await.map(|r| r.content) }
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

    #[test]
    fn test_chat_parts_caption_each_photo() {
        let parts = chat_parts(
            RequestPurpose::RoomScoring,
            ["https://img/a.jpg", "https://img/b.jpg"],
            "score",
        );
        assert_eq!(
            parts,
            vec![
                ContentPart::text("Photo 1:"),
                ContentPart::image_url("https://img/a.jpg"),
                ContentPart::text("Photo 2:"),
                ContentPart::image_url("https://img/b.jpg"),
                ContentPart::text("score"),
            ]
        );
    }
}
