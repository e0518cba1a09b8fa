use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::{simplifier_url, upstream_connect_timeout, upstream_http_timeout};

#[derive(Clone)]
pub struct AppState {
    pub http_client: reqwest::Client,
    /// Simplification service base URL, no trailing slash.
    pub simplifier_url: Arc<str>,
    pub started_at: DateTime<Utc>,
    started: Instant,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    forwarded_requests_total: AtomicU64,
    rejected_requests_total: AtomicU64,
    upstream_errors_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservabilitySnapshot {
    pub forwarded_requests_total: u64,
    pub rejected_requests_total: u64,
    pub upstream_errors_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            forwarded_requests_total: self.forwarded_requests_total.load(Ordering::Relaxed),
            rejected_requests_total: self.rejected_requests_total.load(Ordering::Relaxed),
            upstream_errors_total: self.upstream_errors_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_forwarded_request(&self) {
        self.forwarded_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_request(&self) {
        self.rejected_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn from_env() -> Result<Self, reqwest::Error> {
        Self::new(
            simplifier_url(),
            upstream_http_timeout(),
            upstream_connect_timeout(),
        )
    }

    pub fn new(
        simplifier_url: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent("trajview/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })?;

        let simplifier_url: String = simplifier_url.into();
        Ok(Self {
            http_client,
            simplifier_url: Arc::from(simplifier_url.trim_end_matches('/')),
            started_at: Utc::now(),
            started: Instant::now(),
            observability: Arc::new(ObservabilityCounters::default()),
        })
    }

    /// Upstream endpoint the dashboard's algorithm requests are forwarded to.
    pub fn algorithm_url(&self) -> String {
        format!("{}/algorithm", self.simplifier_url)
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_url_joins_without_double_slash() {
        let state = AppState::new(
            "http://127.0.0.1:5000/",
            Duration::from_secs(5),
            Duration::from_secs(1),
        )
        .expect("client");
        assert_eq!(state.algorithm_url(), "http://127.0.0.1:5000/algorithm");
    }

    #[test]
    fn counters_start_at_zero_and_accumulate() {
        let counters = ObservabilityCounters::default();
        counters.record_forwarded_request();
        counters.record_forwarded_request();
        counters.record_upstream_error();
        assert_eq!(
            counters.snapshot(),
            ObservabilitySnapshot {
                forwarded_requests_total: 2,
                rejected_requests_total: 0,
                upstream_errors_total: 1,
            }
        );
    }
}
