//! Vision gateway trait.
//!
//! A gateway hides everything provider-specific: auth, how photos are
//! attached (direct URL or inline base64), and the retry policy. Callers see
//! one call that either produces the model's text or reports that no usable
//! result came back.

use ai_client::VisionError;
use async_trait::async_trait;

/// Which pass a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestPurpose {
    /// Pass 1: objective per-room scoring
    RoomScoring,

    /// Pass 2: feedback-informed preference check
    PreferenceEval,
}

impl RequestPurpose {
    /// Caption placed before the n-th (1-based) photo.
    pub fn photo_label(&self, n: usize) -> String {
        match self {
            Self::RoomScoring => format!("Photo {n}:"),
            Self::PreferenceEval => format!("Room photo {n}:"),
        }
    }

    pub fn max_tokens(&self) -> u32 {
        match self {
            Self::RoomScoring => 4096,
            Self::PreferenceEval => 1024,
        }
    }
}

/// One photo-plus-prompt request.
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    pub purpose: RequestPurpose,
    pub photo_urls: &'a [String],
    pub prompt: &'a str,
}

impl<'a> VisionRequest<'a> {
    pub fn new(purpose: RequestPurpose, photo_urls: &'a [String], prompt: &'a str) -> Self {
        Self {
            purpose,
            photo_urls,
            prompt,
        }
    }
}

/// What came back from a gateway call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisionResponse {
    /// Model text, or `None` when retries were exhausted or no photo could be
    /// attached.
    pub text: Option<String>,

    /// Photo URLs actually sent, in the order they were numbered in the
    /// request. `photo_index` answers refer to positions in this list.
    pub sent_urls: Vec<String>,
}

impl VisionResponse {
    pub fn text(text: impl Into<String>, sent_urls: Vec<String>) -> Self {
        Self {
            text: Some(text.into()),
            sent_urls,
        }
    }

    pub fn empty(sent_urls: Vec<String>) -> Self {
        Self {
            text: None,
            sent_urls,
        }
    }
}

/// Vision-capable LLM behind a uniform call.
///
/// Errors returned are non-transient provider failures; transient ones are
/// retried inside the gateway and surface as `text: None` once exhausted.
#[async_trait]
pub trait VisionGateway: Send + Sync {
    /// Provider name for logs.
    fn provider(&self) -> &str;

    async fn complete(&self, request: VisionRequest<'_>) -> Result<VisionResponse, VisionError>;
}
