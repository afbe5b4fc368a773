//! HTTP GET with a hard timeout and a small fixed-delay retry policy.
//!
//! Every failure leaving this module is classified as an [`ApiError`]; the
//! caller only ever sees the error of the last attempt.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const MAX_RETRY_COUNT: u32 = 2;
pub const RETRY_DELAY: Duration = Duration::from_millis(1_000);

const RESPONSE_PAYLOAD: &str = "response";

/// A single GET exchange returning the parsed JSON body.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get_json(&self, url: &Url) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, timeout })
    }

    fn classify(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout { timeout_ms: duration_ms(self.timeout) }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &Url) -> Result<Value, ApiError> {
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = res.status();
        if !status.is_success() {
            let body = res
                .json::<Value>()
                .await
                .unwrap_or_else(|_| Value::Object(Default::default()));
            return Err(ApiError::from_status(status, body));
        }

        let body = res.text().await.map_err(|e| self.classify(e))?;
        serde_json::from_str(&body).map_err(|e| ApiError::formatting(RESPONSE_PAYLOAD, e))
    }
}

/// Fixed-delay retry settings. `max_retries` counts attempts after the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: MAX_RETRY_COUNT, delay: RETRY_DELAY }
    }
}

#[derive(Debug, Clone)]
pub struct FetchClient<T = HttpTransport> {
    transport: T,
    timeout: Duration,
    retry: RetryPolicy,
}

impl<T: Transport> FetchClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, timeout: REQUEST_TIMEOUT, retry: RetryPolicy::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `url` and return its JSON body, retrying transient failures.
    ///
    /// Errors with status 401, 403 or 404, validation errors and unparseable
    /// bodies are returned after the first attempt. Other errors are retried up to
    /// `max_retries` times with a fixed delay before each retry.
    pub async fn fetch_json(&self, url: &Url) -> Result<Value, ApiError> {
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                warn!(
                    attempt,
                    max_retries = self.retry.max_retries,
                    url = %redact_url(url),
                    "retrying weather API request"
                );
                tokio::time::sleep(self.retry.delay).await;
            }

            match self.attempt(url).await {
                Ok(body) => return Ok(body),
                Err(err) if attempt < self.retry.max_retries && err.is_retryable() => {
                    debug!(attempt, code = %err.code(), error = %err, "weather API attempt failed");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt(&self, url: &Url) -> Result<Value, ApiError> {
        // Dropping the transport future on expiry aborts the in-flight request.
        match tokio::time::timeout(self.timeout, self.transport.get_json(url)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout { timeout_ms: duration_ms(self.timeout) }),
        }
    }
}

/// `url` with the API key query value masked, for logging.
pub fn redact_url(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| key == "appid") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "appid" { "***".to_string() } else { value.into_owned() };
            (key.into_owned(), value)
        })
        .collect();

    let mut shown = url.clone();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
