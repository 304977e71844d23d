//! Testing utilities including a scripted vision gateway.
//!
//! These are useful for exercising the scoring pipeline without making real
//! provider calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use ai_client::VisionError;

use crate::traits::vision::{RequestPurpose, VisionGateway, VisionRequest, VisionResponse};

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Model text.
    Text(String),

    /// A non-transient provider error.
    Error(VisionError),

    /// Retries exhausted: no usable text.
    Exhausted,

    /// Wait, then answer with the inner reply.
    Delay(Duration, Box<MockReply>),

    /// Panic inside the call.
    Panic,
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn delayed(delay: Duration, reply: MockReply) -> Self {
        Self::Delay(delay, Box::new(reply))
    }
}

/// Record of a call made to the mock gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct MockVisionCall {
    pub purpose: RequestPurpose,
    pub photo_urls: Vec<String>,
    pub prompt: String,
}

/// A mock vision gateway for testing.
///
/// Replies are looked up by purpose and the first photo URL of the request,
/// falling back to a per-purpose default. Without either, the call behaves
/// as if retries were exhausted.
#[derive(Default)]
pub struct MockGateway {
    /// Replies keyed by (purpose, first photo URL)
    replies: Arc<RwLock<HashMap<(RequestPurpose, String), MockReply>>>,

    /// Fallback reply per purpose
    defaults: Arc<RwLock<HashMap<RequestPurpose, MockReply>>>,

    /// URLs treated as unfetchable (never sent)
    dropped: Arc<RwLock<HashSet<String>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockVisionCall>>>,

    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply for requests of `purpose` whose first photo is `first_photo`.
    pub fn with_reply(
        self,
        purpose: RequestPurpose,
        first_photo: impl Into<String>,
        reply: MockReply,
    ) -> Self {
        self.replies
            .write()
            .unwrap()
            .insert((purpose, first_photo.into()), reply);
        self
    }

    /// Reply for any request of `purpose` without a specific reply.
    pub fn with_default(self, purpose: RequestPurpose, reply: MockReply) -> Self {
        self.defaults.write().unwrap().insert(purpose, reply);
        self
    }

    /// Treat `url` as unfetchable: it is left out of the photos sent.
    pub fn dropping(self, url: impl Into<String>) -> Self {
        self.dropped.write().unwrap().insert(url.into());
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockVisionCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn calls_for(&self, purpose: RequestPurpose) -> Vec<MockVisionCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.purpose == purpose)
            .collect()
    }

    /// Most calls that were in progress at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn reply_for(&self, purpose: RequestPurpose, photo_urls: &[String]) -> MockReply {
        let keyed = photo_urls.first().and_then(|first| {
            self.replies
                .read()
                .unwrap()
                .get(&(purpose, first.clone()))
                .cloned()
        });
        keyed
            .or_else(|| self.defaults.read().unwrap().get(&purpose).cloned())
            .unwrap_or(MockReply::Exhausted)
    }
}

/// Decrements the in-flight counter even if the call is cancelled.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl VisionGateway for MockGateway {
    fn provider(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: VisionRequest<'_>) -> Result<VisionResponse, VisionError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(self.in_flight.clone());

        self.calls.write().unwrap().push(MockVisionCall {
            purpose: request.purpose,
            photo_urls: request.photo_urls.to_vec(),
            prompt: request.prompt.to_string(),
        });

        let sent_urls: Vec<String> = {
            let dropped = self.dropped.read().unwrap();
            request
                .photo_urls
                .iter()
                .filter(|url| !dropped.contains(*url))
                .cloned()
                .collect()
        };

        let mut reply = self.reply_for(request.purpose, request.photo_urls);
        loop {
            match reply {
                MockReply::Delay(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
                MockReply::Text(text) => return Ok(VisionResponse::text(text, sent_urls)),
                MockReply::Error(e) => return Err(e),
                MockReply::Exhausted => return Ok(VisionResponse::empty(sent_urls)),
                MockReply::Panic => panic!("mock gateway panic"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keyed_reply_beats_default() {
        let gateway = MockGateway::new()
            .with_default(RequestPurpose::RoomScoring, MockReply::text("default"))
            .with_reply(RequestPurpose::RoomScoring, "https://img/a.jpg", MockReply::text("keyed"));

        let a = vec!["https://img/a.jpg".to_string()];
        let b = vec!["https://img/b.jpg".to_string()];
        let prompt = "score";

        let resp = gateway
            .complete(VisionRequest::new(RequestPurpose::RoomScoring, &a, prompt))
            .await
            .unwrap();
        assert_eq!(resp.text.as_deref(), Some("keyed"));

        let resp = gateway
            .complete(VisionRequest::new(RequestPurpose::RoomScoring, &b, prompt))
            .await
            .unwrap();
        assert_eq!(resp.text.as_deref(), Some("default"));

        let resp = gateway
            .complete(VisionRequest::new(RequestPurpose::PreferenceEval, &b, prompt))
            .await
            .unwrap();
        assert_eq!(resp.text, None);

        assert_eq!(gateway.calls().len(), 3);
        assert_eq!(gateway.calls_for(RequestPurpose::PreferenceEval).len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_urls_not_sent() {
        let gateway = MockGateway::new()
            .dropping("https://img/a.jpg")
            .with_default(RequestPurpose::RoomScoring, MockReply::text("[]"));
        let photos = vec!["https://img/a.jpg".to_string(), "https://img/b.jpg".to_string()];

        let resp = gateway
            .complete(VisionRequest::new(RequestPurpose::RoomScoring, &photos, "score"))
            .await
            .unwrap();
        assert_eq!(resp.sent_urls, vec!["https://img/b.jpg".to_string()]);
    }
}
