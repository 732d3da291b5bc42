//! Outbound HTTP with retry.
//!
//! Portals in the registry run misconfigured or self-signed TLS, so
//! certificate validation is deliberately disabled for these requests.
//! Transient failures (connection resets, timeouts, chunked-encoding
//! errors, 429/5xx statuses) are retried with exponential backoff; a
//! source that stays down is skipped for the current cycle.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};
use reqwest::Client;
use tracing::{error, warn};

use crate::error::{AppError, Result};

const USER_AGENT_STRING: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Seam for substituting canned pages in tests.
pub trait PageSource {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// One attempt's outcome, as seen by the retry loop.
#[derive(Debug)]
pub enum AttemptError {
    Retryable(AppError),
    Fatal(AppError),
}

/// Bounded exponential backoff: waits of `base_delay * 2^(attempt-1)`
/// between attempts (2s, 4s with the defaults), up to `max_attempts`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Run `op` until it succeeds, fails fatally, or the attempt budget
    /// runs out. Exhaustion maps to [`AppError::FetchExhausted`].
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, AttemptError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retryable(e)) if attempt < self.max_attempts => {
                    let wait = self.delay_for(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        wait_secs = wait.as_secs(),
                        "attempt failed for {label}, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(AttemptError::Retryable(e)) => {
                    error!(error = %e, attempts = attempt, "giving up on {label}");
                    return Err(AppError::FetchExhausted {
                        url: label.to_string(),
                        attempts: attempt,
                    });
                }
            }
        }
    }
}

pub struct PageFetcher {
    client: Client,
    retry: RetryPolicy,
}

/// Header set the portals expect from a regular browser visit.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("pt-BR,pt;q=0.9,en;q=0.8"),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers
}

impl PageFetcher {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .default_headers(browser_headers())
            // Several portals serve broken certificate chains.
            .danger_accept_invalid_certs(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, retry }
    }

    async fn try_fetch(&self, url: &str) -> std::result::Result<String, AttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(AppError::Http(e)))?;

        let status = response.status();
        if status.is_success() {
            return response
                .text()
                .await
                .map_err(|e| AttemptError::Retryable(AppError::Http(e)));
        }

        let err = anyhow::anyhow!("HTTP {} from {}", status, url).into();
        if RETRYABLE_STATUSES.contains(&status.as_u16()) {
            Err(AttemptError::Retryable(err))
        } else {
            Err(AttemptError::Fatal(err))
        }
    }
}

impl PageSource for PageFetcher {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
        async move { self.retry.run(url, || self.try_fetch(url)).await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> AttemptError {
        AttemptError::Retryable(anyhow::anyhow!("connection reset").into())
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_after_three_attempts_with_increasing_waits() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<()> = policy
            .run("https://example.gov.br/noticias/", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // 2s after the first failure, 4s after the second
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        match result {
            Err(AppError::FetchExhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected FetchExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);

        let result = policy
            .run("retry-then-ok", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(transient())
                    } else {
                        Ok("page".to_string())
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "page");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("not-found", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(AttemptError::Fatal(anyhow::anyhow!("HTTP 404").into())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn browser_headers_cover_the_full_set() {
        let headers = browser_headers();
        assert!(headers[USER_AGENT].to_str().unwrap().contains("Mozilla/5.0"));
        assert!(headers[ACCEPT].to_str().unwrap().starts_with("text/html"));
        assert!(headers[ACCEPT_LANGUAGE]
            .to_str()
            .unwrap()
            .starts_with("pt-BR"));
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers[UPGRADE_INSECURE_REQUESTS], "1");
    }

    #[test]
    fn backoff_delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }
}
