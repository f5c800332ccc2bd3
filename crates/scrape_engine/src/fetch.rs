use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use futures_util::StreamExt;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::types::{FailureKind, FetchError, FetchMetadata, FetchOutput};

/// Fixed browser-like request headers. Fiction hosts fingerprint obvious
/// bot clients, so every request carries a desktop browser signature with a
/// zh-CN language preference.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first request.
    pub max_attempts: u32,
    /// Base backoff; the delay before retry `n` is `backoff_base * n`.
    pub backoff_base: Duration,
    /// Upper bound of the random addition to each backoff delay.
    pub backoff_jitter: Duration,
    /// Upper bound of the random pause inserted before every request.
    pub pre_request_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            backoff_jitter: Duration::from_millis(250),
            pre_request_delay: Duration::from_millis(400),
        }
    }
}

impl RetryPolicy {
    /// Deterministic part of the backoff: strictly increasing with attempt.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }

    fn jittered_backoff(&self, attempt: u32) -> Duration {
        self.backoff_delay(attempt) + random_delay(self.backoff_jitter)
    }
}

/// Random duration in `0..=bound`, sampled eagerly so no RNG handle lives
/// across an await point.
fn random_delay(bound: Duration) -> Duration {
    let bound_ms = bound.as_millis() as u64;
    if bound_ms == 0 {
        return Duration::ZERO;
    }
    let ms = rand::thread_rng().gen_range(0..=bound_ms);
    Duration::from_millis(ms)
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Accepted Content-Type values; a response without the header passes.
    pub allowed_content_types: Vec<String>,
    pub retry: RetryPolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            retry: RetryPolicy::default(),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self, redirect_counter: Arc<AtomicUsize>) -> Result<reqwest::Client, FetchError> {
        let redirect_limit = self.settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            redirect_counter.store(count, Ordering::Relaxed);
            if count >= redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );
        headers.insert(
            reqwest::header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );

        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(policy)
            .default_headers(headers)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let client = self.build_client(redirect_counter.clone())?;

        let response = client
            .get(parsed.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        if !(200..400).contains(&status) {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status),
                response.status().to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            status,
            redirect_count: redirect_counter.load(Ordering::Relaxed),
            content_type,
            byte_len: bytes.len() as u64,
        };

        Ok(FetchOutput { bytes, metadata })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    /// Fetch with a bounded, strictly sequential retry budget.
    ///
    /// Permanent failures (403/404, oversize, bad content type, redirect cap)
    /// surface immediately; transient ones retry with a growing jittered
    /// backoff until the attempt budget runs out, then surface the last error
    /// annotated with the attempt count.
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let retry = &self.settings.retry;
        let mut attempt: u32 = 1;
        loop {
            let pause = random_delay(retry.pre_request_delay);
            if pause > Duration::ZERO {
                tokio::time::sleep(pause).await;
            }

            match self.fetch_once(url).await {
                Ok(output) => {
                    engine_debug!(
                        "fetched {} ({} bytes, status {}) on attempt {attempt}",
                        output.metadata.final_url,
                        output.metadata.byte_len,
                        output.metadata.status
                    );
                    return Ok(output);
                }
                Err(err) if err.kind.is_permanent() => {
                    engine_debug!("fetch of {url} failed permanently: {}", err.kind);
                    return Err(err.with_attempts(attempt));
                }
                Err(err) => {
                    if attempt >= retry.max_attempts {
                        engine_warn!(
                            "giving up on {url} after {attempt} attempt(s): {}",
                            err.kind
                        );
                        return Err(err.with_attempts(attempt));
                    }
                    let delay = retry.jittered_backoff(attempt);
                    engine_warn!(
                        "attempt {attempt} for {url} failed ({}), retrying in {delay:?}",
                        err.kind
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::RetryPolicy;
    use std::time::Duration;

    #[test]
    fn backoff_grows_strictly_with_attempt_number() {
        let policy = RetryPolicy::default();
        let first = policy.backoff_delay(1);
        let second = policy.backoff_delay(2);
        let third = policy.backoff_delay(3);
        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn jitter_is_bounded_by_the_policy() {
        let policy = RetryPolicy {
            backoff_base: Duration::from_millis(10),
            backoff_jitter: Duration::from_millis(5),
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let delay = policy.jittered_backoff(2);
            assert!(delay >= Duration::from_millis(20));
            assert!(delay <= Duration::from_millis(25));
        }
    }
}
