//! Configuration types for scoring runs and vision providers.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{EvalError, Result};
use crate::gateway::{
    retry::RetryPolicy, AnthropicGateway, OpenAiGateway, OpenRouterGateway,
    DEFAULT_OPENROUTER_MODEL,
};
use crate::traits::vision::VisionGateway;

/// Configuration for a batch scoring run.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Listings scored concurrently.
    ///
    /// Default: 3.
    pub workers: usize,

    /// Wall-clock limit for one listing, independent of gateway retries.
    ///
    /// Default: 120 seconds.
    pub per_listing_timeout: Duration,

    /// Feedback entries needed before filtering is trusted.
    ///
    /// Below this, every listing that reaches rule evaluation passes.
    /// Default: 10.
    pub cold_start_threshold: usize,

    /// Use feedback even below the cold-start threshold.
    pub force_feedback: bool,

    /// Most recent feedback entries injected into the preference prompt.
    ///
    /// Default: 10.
    pub feedback_limit: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            per_listing_timeout: Duration::from_secs(120),
            cold_start_threshold: 10,
            force_feedback: false,
            feedback_limit: 10,
        }
    }
}

impl ScoringConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_per_listing_timeout(mut self, timeout: Duration) -> Self {
        self.per_listing_timeout = timeout;
        self
    }

    pub fn with_cold_start_threshold(mut self, threshold: usize) -> Self {
        self.cold_start_threshold = threshold;
        self
    }

    pub fn with_force_feedback(mut self, force: bool) -> Self {
        self.force_feedback = force;
        self
    }

    pub fn with_feedback_limit(mut self, limit: usize) -> Self {
        self.feedback_limit = limit;
        self
    }

    /// Whether a corpus of `feedback_count` entries leaves the run in cold start.
    pub fn is_cold_start(&self, feedback_count: usize) -> bool {
        feedback_count < self.cold_start_threshold && !self.force_feedback
    }
}

/// Which vision provider scores photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    OpenRouter,
}

impl ProviderKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "openrouter" => Ok(Self::OpenRouter),
            other => Err(EvalError::Config(format!(
                "Unknown LLM_PROVIDER: {other}. Use 'openai', 'anthropic', or 'openrouter'."
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::OpenRouter => "openrouter",
        }
    }

    fn key_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

/// Vision provider selection and credentials.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,

    /// Per HTTP call to the provider.
    ///
    /// Default: 60 seconds.
    pub request_timeout: Duration,

    pub retry: RetryPolicy,
}

impl ProviderConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            openai_api_key: None,
            anthropic_api_key: None,
            openrouter_api_key: None,
            openrouter_model: DEFAULT_OPENROUTER_MODEL.to_string(),
            request_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }

    /// Read `LLM_PROVIDER` (default `openrouter`), the provider API keys, and
    /// `OPENROUTER_MODEL`.
    pub fn from_env() -> Result<Self> {
        let provider = match std::env::var("LLM_PROVIDER") {
            Ok(raw) if !raw.trim().is_empty() => ProviderKind::parse(&raw)?,
            _ => ProviderKind::OpenRouter,
        };
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let mut config = Self::new(provider);
        config.openai_api_key = non_empty("OPENAI_API_KEY");
        config.anthropic_api_key = non_empty("ANTHROPIC_API_KEY");
        config.openrouter_api_key = non_empty("OPENROUTER_API_KEY");
        if let Some(model) = non_empty("OPENROUTER_MODEL") {
            config.openrouter_model = model;
        }
        Ok(config)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = Some(key.into());
        match self.provider {
            ProviderKind::OpenAi => self.openai_api_key = key,
            ProviderKind::Anthropic => self.anthropic_api_key = key,
            ProviderKind::OpenRouter => self.openrouter_api_key = key,
        }
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn api_key(&self) -> Option<&str> {
        match self.provider {
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
            ProviderKind::OpenRouter => self.openrouter_api_key.as_deref(),
        }
    }

    /// Build the gateway for the selected provider.
    ///
    /// Fails when the selected provider's API key is missing.
    pub fn build_gateway(&self) -> Result<Arc<dyn VisionGateway>> {
        let api_key = self.api_key().ok_or_else(|| {
            EvalError::Config(format!(
                "{} is not set; required when LLM_PROVIDER={}",
                self.provider.key_var(),
                self.provider.as_str()
            ))
        })?;

        let gateway: Arc<dyn VisionGateway> = match self.provider {
            ProviderKind::OpenAi => Arc::new(
                OpenAiGateway::new(api_key, self.request_timeout).with_retry(self.retry.clone()),
            ),
            ProviderKind::Anthropic => Arc::new(
                AnthropicGateway::new(api_key, self.request_timeout)
                    .with_retry(self.retry.clone()),
            ),
            ProviderKind::OpenRouter => Arc::new(
                OpenRouterGateway::new(api_key, &self.openrouter_model, self.request_timeout)
                    .with_retry(self.retry.clone()),
            ),
        };
        Ok(gateway)
    }
}
