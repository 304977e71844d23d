//! Provider-agnostic vision chat client
//!
//! Minimal REST clients for the chat APIs that accept images alongside text.
//! No domain logic lives here: callers build the content parts, the clients
//! ship them and hand back the model's text.
//!
//! # Example
//!
//! ```rust,ignore
//! use ai_client::{ChatClient, ChatRequest, ContentPart, Message};
//!
//! let client = ChatClient::openrouter(api_key);
//!
//! let response = client.chat_completion(
//!     ChatRequest::new("anthropic/claude-sonnet-4.5")
//!         .max_tokens(1024)
//!         .message(Message::user(vec![
//!             ContentPart::image_url("https://example.com/a.jpg"),
//!             ContentPart::text("Describe this room"),
//!         ])),
//! ).await?;
//! ```

pub mod anthropic;
pub mod error;
pub mod types;

pub use anthropic::AnthropicClient;
pub use error::{Result, VisionError};
pub use types::*;

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Client for OpenAI-compatible chat completion APIs (OpenAI, OpenRouter).
#[derive(Clone)]
pub struct ChatClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl ChatClient {
    /// Create a new client against the OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    /// Create a client against OpenRouter's OpenAI-compatible API.
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new(api_key).with_base_url(OPENROUTER_BASE_URL)
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| VisionError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies, OpenRouter, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Apply a whole-request timeout to every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client with timeout, using defaults");
                Client::new()
            });
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// Send messages to the chat completion API and get a response.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Chat completion request failed");
                VisionError::from_reqwest(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Chat completion API error");
            return Err(VisionError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let chat_response: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| VisionError::Parse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| VisionError::Parse("No choices in chat completion".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "Chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: chat_response.usage,
        })
    }
}
