//! Retry logic: a fixed pre-attempt throttle plus exponential backoff.

use std::time::Duration;

use tracing::{debug, warn};

use crate::http_client::{HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse};
use crate::ProviderId;

/// Backoff between failed attempts of one request.
///
/// The delay after failed attempt `n` (0-based) is
/// `base_delay * multiplier^n`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Whether to apply random jitter (+/- 50%) to the delay.
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(3),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            jitter: false,
        }
    }
}

impl BackoffPolicy {
    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// A single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt `attempt` (0-based), or `None`
    /// when that attempt was the last one allowed.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt.saturating_add(1) >= self.max_attempts {
            return None;
        }

        let scale = self.multiplier.powi(attempt as i32);
        let seconds = self.base_delay.as_secs_f64() * scale;
        let capped_seconds = seconds.min(self.max_delay.as_secs_f64());
        let mut delay = Duration::from_secs_f64(capped_seconds);

        if self.jitter {
            let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
            let random_offset = fastrand::u64(0..=(jitter_ms * 2));
            let total_ms = delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
            delay = Duration::from_millis(total_ms.max(0) as u64);
        }

        Some(delay)
    }
}

/// Configuration for the automatic retry mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub backoff: BackoffPolicy,
    /// Fixed delay awaited before every attempt, the first one included.
    pub throttle: Duration,
    /// HTTP status codes that should trigger a retry.
    pub retry_on_status: Vec<u16>,
    pub retry_on_timeout: bool,
    pub retry_on_connect: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            throttle: Duration::from_secs(1),
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
            retry_on_timeout: true,
            retry_on_connect: true,
        }
    }
}

impl RetryConfig {
    /// Single attempt without throttling; used by tests and offline tooling.
    pub fn immediate() -> Self {
        Self {
            backoff: BackoffPolicy::no_retry(),
            throttle: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    pub fn should_retry(&self, error: &HttpError) -> bool {
        match error.kind() {
            HttpErrorKind::Timeout => self.retry_on_timeout,
            HttpErrorKind::Connect => self.retry_on_connect,
            HttpErrorKind::Status(status) => self.should_retry_status(status),
            HttpErrorKind::Other => self.retry_on_connect,
        }
    }
}

/// Sends `request`, throttling before every attempt and backing off between
/// retryable failures.
///
/// Returns the response for any success or non-retryable status so callers can
/// interpret it (a 404 means different things to different providers). Returns
/// the last error once attempts are exhausted.
pub async fn send_with_retry(
    client: &dyn HttpClient,
    request: &HttpRequest,
    config: &RetryConfig,
    provider: ProviderId,
) -> Result<HttpResponse, HttpError> {
    let mut attempt = 0;
    loop {
        if !config.throttle.is_zero() {
            tokio::time::sleep(config.throttle).await;
        }

        debug!(%provider, url = %request.url, attempt = attempt + 1, "sending request");
        let error = match client.execute(request.clone()).await {
            Ok(response) if response.is_success() || !config.should_retry_status(response.status) => {
                return Ok(response);
            }
            Ok(response) => HttpError::status(response.status),
            Err(error) if config.should_retry(&error) => error,
            Err(error) => return Err(error),
        };

        match config.backoff.delay_after(attempt) {
            Some(delay) => {
                warn!(
                    %provider,
                    url = %request.url,
                    attempt = attempt + 1,
                    max_attempts = config.backoff.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "request failed, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            None => {
                warn!(
                    %provider,
                    url = %request.url,
                    attempts = attempt + 1,
                    error = %error,
                    "request failed, retries exhausted"
                );
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct FlakyClient {
        calls: AtomicU32,
        failures: u32,
        failure: HttpError,
    }

    impl FlakyClient {
        fn new(failures: u32, failure: HttpError) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                failure,
            }
        }
    }

    impl HttpClient for FlakyClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            Box::pin(async move {
                let call = self.calls.fetch_add(1, Ordering::SeqCst);
                if call < self.failures {
                    Err(self.failure.clone())
                } else {
                    Ok(HttpResponse::ok_json("[]"))
                }
            })
        }
    }

    #[test]
    fn default_backoff_doubles_from_three_seconds() {
        let backoff = BackoffPolicy::default();

        assert_eq!(backoff.delay_after(0), Some(Duration::from_secs(3)));
        assert_eq!(backoff.delay_after(1), Some(Duration::from_secs(6)));
        assert_eq!(backoff.delay_after(2), None);
    }

    #[test]
    fn backoff_is_capped() {
        let backoff = BackoffPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(1),
            jitter: false,
        };

        assert_eq!(backoff.delay_after(3), Some(Duration::from_millis(800)));
        assert_eq!(backoff.delay_after(4), Some(Duration::from_secs(1)));
    }

    #[test]
    fn jitter_stays_within_half_of_the_base_delay() {
        let backoff = BackoffPolicy {
            jitter: true,
            ..BackoffPolicy::exponential(3, Duration::from_millis(1000))
        };

        for _ in 0..20 {
            let delay = backoff.delay_after(0).expect("second attempt allowed");
            assert!(delay >= Duration::from_millis(500), "{delay:?}");
            assert!(delay <= Duration::from_millis(1500), "{delay:?}");
        }
    }

    #[test]
    fn no_retry_allows_a_single_attempt() {
        assert_eq!(BackoffPolicy::no_retry().delay_after(0), None);
    }

    #[test]
    fn default_config_retries_transient_statuses_only() {
        let config = RetryConfig::default();

        assert!(config.should_retry_status(429));
        assert!(config.should_retry_status(503));
        assert!(!config.should_retry_status(404));
        assert!(config.should_retry(&HttpError::timeout("slow")));
        assert!(!config.should_retry(&HttpError::status(400)));
    }

    #[tokio::test(start_paused = true)]
    async fn throttles_every_attempt_and_backs_off_between_failures() {
        let client = FlakyClient::new(2, HttpError::timeout("slow upstream"));
        let config = RetryConfig::default();
        let started = tokio::time::Instant::now();

        let response = send_with_retry(
            &client,
            &HttpRequest::get("https://example.test/drivers"),
            &config,
            ProviderId::Live,
        )
        .await
        .expect("third attempt succeeds");

        assert!(response.is_success());
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        // 1s throttle x3, plus 3s and 6s of backoff.
        assert_eq!(started.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_error_after_exhausting_attempts() {
        let client = FlakyClient::new(u32::MAX, HttpError::connect("refused"));

        let error = send_with_retry(
            &client,
            &HttpRequest::get("https://example.test/pit"),
            &RetryConfig::default(),
            ProviderId::Live,
        )
        .await
        .expect_err("every attempt fails");

        assert_eq!(error.kind(), HttpErrorKind::Connect);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_errors_fail_fast() {
        let client = FlakyClient::new(u32::MAX, HttpError::status(400));

        let error = send_with_retry(
            &client,
            &HttpRequest::get("https://example.test/pit"),
            &RetryConfig::immediate(),
            ProviderId::Live,
        )
        .await
        .expect_err("fails");

        assert_eq!(error.kind(), HttpErrorKind::Status(400));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
