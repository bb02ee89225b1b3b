//! Request pacer — minimum spacing between outbound completion calls,
//! plus bounded retry on rate-limit signals.
//!
//! Pacing is client-side and advisory: it protects a known low
//! per-minute quota. The retry path additionally respects server-side
//! backoff hints for when client-side pacing alone is insufficient
//! (e.g. a quota shared across processes).
//!
//! This is a leaky-bucket-of-one: a lower bound on inter-call spacing,
//! no burst allowance, no token reservoir.

use recall_core::error::CompletionError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Paces outbound calls on one logical channel.
///
/// All callers sharing one pacer are serialized: the mutex over
/// `last_request` is held across the wait, so acquire + dispatch is
/// atomic with respect to other callers and two callers can never race
/// past the interval check together.
pub struct RequestPacer {
    min_interval: Duration,
    default_retry_after: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Create a pacer with the given minimum inter-dispatch interval.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            default_retry_after: Duration::from_secs(60),
            last_request: Mutex::new(None),
        }
    }

    /// Override the backoff used when a rate-limit signal carries no
    /// server-advised retry-after duration.
    pub fn with_default_retry_after(mut self, default_retry_after: Duration) -> Self {
        self.default_retry_after = default_retry_after;
        self
    }

    /// Suspend the caller until at least `min_interval` has elapsed since
    /// the previous `acquire()` returned, then record the dispatch time.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_secs = wait.as_secs_f64(), "Pacing: waiting before dispatch");
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Invoke `call` through the pacer with bounded retry on rate-limit
    /// signals.
    ///
    /// `max_retries` counts total attempts. On a rate-limit error before
    /// the last attempt, sleeps for the server-advised duration (or the
    /// default when absent) and tries again. Any other error propagates
    /// immediately; exhausting attempts propagates the last rate-limit
    /// error.
    pub async fn call_with_retry<T, F, Fut>(
        &self,
        max_retries: u32,
        mut call: F,
    ) -> Result<T, CompletionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CompletionError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.acquire().await;

            match call().await {
                Ok(value) => return Ok(value),
                Err(CompletionError::RateLimited { retry_after_secs }) if attempt < max_retries => {
                    let backoff = retry_after_secs
                        .map(Duration::from_secs)
                        .unwrap_or(self.default_retry_after);
                    warn!(
                        attempt,
                        max_retries,
                        backoff_secs = backoff.as_secs(),
                        "Rate limit hit, backing off before retry"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn consecutive_acquires_are_spaced() {
        let pacer = RequestPacer::new(Duration::from_secs(5));

        let start = Instant::now();
        pacer.acquire().await;
        pacer.acquire().await;

        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn first_acquire_does_not_wait() {
        let pacer = RequestPacer::new(Duration::from_secs(5));

        let start = Instant::now();
        pacer.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquires_serialize() {
        let pacer = Arc::new(RequestPacer::new(Duration::from_secs(5)));

        let start = Instant::now();
        let a = tokio::spawn({
            let pacer = pacer.clone();
            async move { pacer.acquire().await }
        });
        let b = tokio::spawn({
            let pacer = pacer.clone();
            async move { pacer.acquire().await }
        });
        let c = tokio::spawn({
            let pacer = pacer.clone();
            async move { pacer.acquire().await }
        });
        let (ra, rb, rc) = tokio::join!(a, b, c);
        ra.unwrap();
        rb.unwrap();
        rc.unwrap();

        // Three dispatches, two enforced gaps
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    fn rate_limited_until(succeed_on: u32) -> (Arc<AtomicU32>, impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let call = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Box::pin(async move {
                if n < succeed_on {
                    Err(CompletionError::RateLimited {
                        retry_after_secs: Some(1),
                    })
                } else {
                    Ok("done".to_string())
                }
            }) as std::pin::Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send>>
        };
        (calls, call)
    }

    #[tokio::test(start_paused = true)]
    async fn retry_succeeds_within_attempts() {
        let pacer = RequestPacer::new(Duration::ZERO);
        let (calls, call) = rate_limited_until(3);

        let result = pacer.call_with_retry(3, call).await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_exhaustion_propagates_rate_limit() {
        let pacer = RequestPacer::new(Duration::ZERO);
        let (calls, call) = rate_limited_until(3);

        let result = pacer.call_with_retry(2, call).await;
        assert!(matches!(
            result,
            Err(CompletionError::RateLimited { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_errors_do_not_retry() {
        let pacer = RequestPacer::new(Duration::ZERO);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<String, _> = pacer
            .call_with_retry(3, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<String, _>(CompletionError::ApiError {
                        status_code: 500,
                        message: "boom".into(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(CompletionError::ApiError { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_uses_server_advised_backoff() {
        let pacer = RequestPacer::new(Duration::ZERO);
        let (_, call) = rate_limited_until(2);

        let start = Instant::now();
        let result = pacer.call_with_retry(3, call).await;
        assert!(result.is_ok());
        // One backoff of the advised 1 second
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
