//! OpenRouter gateway: OpenAI-compatible API, photos inlined as base64.

use ai_client::{ChatClient, ChatRequest, Message, VisionError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use super::images::ImageInliner;
use super::openai::chat_parts;
use super::retry::{with_retries, RetryPolicy};
use crate::traits::vision::{VisionGateway, VisionRequest, VisionResponse};

/// Must support vision.
pub const DEFAULT_OPENROUTER_MODEL: &str = "anthropic/claude-sonnet-4.5";

pub struct OpenRouterGateway {
    client: ChatClient,
    images: ImageInliner,
    model: String,
    retry: RetryPolicy,
}

impl OpenRouterGateway {
    pub fn new(api_key: &str, model: &str, request_timeout: Duration) -> Self {
        Self {
            client: ChatClient::openrouter(api_key).with_timeout(request_timeout),
            images: ImageInliner::default(),
            model: model.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Point at an OpenRouter-compatible endpoint other than the public API.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }

    pub fn with_images(mut self, images: ImageInliner) -> Self {
        self.images = images;
        self
    }
}

#[async_trait]
impl VisionGateway for OpenRouterGateway {
    fn provider(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: VisionRequest<'_>) -> Result<VisionResponse, VisionError> {
        let inlined = self.images.inline_all(request.photo_urls).await;
        if inlined.is_empty() {
            warn!(
                provider = self.provider(),
                requested = request.photo_urls.len(),
                "No images could be fetched for vision call"
            );
            return Ok(VisionResponse::empty(Vec::new()));
        }

        let sent_urls: Vec<String> = inlined.iter().map(|(url, _)| url.clone()).collect();
        let parts = chat_parts(
            request.purpose,
            inlined.iter().map(|(_, data_url)| data_url.as_str()),
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

        Ok(VisionResponse { text, sent_urls })
    }
}
