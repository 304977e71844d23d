//! Exponential backoff for provider calls.

use std::future::Future;
use std::time::Duration;

use ai_client::VisionError;
use tracing::{error, warn};

/// Retry policy for transient provider errors.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts in total, including the first.
    ///
    /// Default: 3.
    pub max_attempts: u32,

    /// Wait before retry n (0-based) is `base_delay * 2^(n+1)`.
    ///
    /// Default: 1 second (2s, 4s, ...).
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt + 1)
    }
}

/// Run `call` until it succeeds, fails non-transiently, or attempts run out.
///
/// Returns `Ok(None)` when every attempt failed transiently.
pub async fn with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    provider: &str,
    mut call: F,
) -> Result<Option<T>, VisionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, VisionError>>,
{
    for attempt in 0..policy.max_attempts {
        match call().await {
            Ok(value) => return Ok(Some(value)),
            Err(e) if e.is_transient() => {
                if attempt + 1 == policy.max_attempts {
                    warn!(provider, attempt = attempt + 1, error = %e, "Transient provider error on final attempt");
                    break;
                }
                let wait = policy.backoff(attempt);
                warn!(
                    provider,
                    attempt = attempt + 1,
                    wait_secs = wait.as_secs_f64(),
                    error = %e,
                    "Transient provider error, retrying"
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => return Err(e),
        }
    }

    error!(provider, attempts = policy.max_attempts, "Exhausted retries for vision call");
    Ok(None)
}
