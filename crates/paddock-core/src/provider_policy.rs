use std::time::Duration;

use crate::retry::{BackoffPolicy, RetryConfig};
use crate::ProviderId;

pub const DEFAULT_LIVE_URL: &str = "https://api.openf1.org/v1";
pub const DEFAULT_ARCHIVE_URL: &str = "https://api.jolpi.ca/ergast/f1";
pub const DEFAULT_TIMING_URL: &str = "https://livetiming.formula1.com/static";

/// Endpoint, timeout and retry behaviour for one upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl ProviderPolicy {
    /// Live API: 1s throttle before each attempt, 3 attempts, 3s doubling
    /// backoff and a 90s request timeout.
    pub fn live_default() -> Self {
        Self {
            provider_id: ProviderId::Live,
            base_url: String::from(DEFAULT_LIVE_URL),
            timeout: Duration::from_secs(90),
            retry: RetryConfig::default(),
        }
    }

    /// Batch archive: results, laps and timing feeds. The results API allows a
    /// few requests per second, so the throttle is shorter than the live one.
    pub fn archive_default() -> Self {
        Self {
            provider_id: ProviderId::Archive,
            base_url: String::from(DEFAULT_ARCHIVE_URL),
            timeout: Duration::from_secs(60),
            retry: RetryConfig {
                backoff: BackoffPolicy::exponential(3, Duration::from_secs(2)),
                throttle: Duration::from_millis(300),
                ..RetryConfig::default()
            },
        }
    }

    /// Same retry behaviour as the archive, pointed at the timing feed host.
    pub fn timing_default() -> Self {
        Self {
            base_url: String::from(DEFAULT_TIMING_URL),
            ..Self::archive_default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
