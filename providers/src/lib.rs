//! HTTP clients used by Resonance.
//!
//! - [`openai`] - OpenAI Chat Completions client (single-shot, non-streaming)
//! - [`links`] - Reachability probe for organization URLs
//! - [`retry`] - Backoff policy shared by every request
//!
//! # Configuration
//!
//! [`ApiConfig`] bundles the key, model and request knobs. The client is built
//! once per [`openai::OpenAiClient`] with the configured timeout.
//!
//! # Error Handling
//!
//! Failures surface as [`ProviderError`]. Non-2xx responses keep the status and
//! a capped copy of the body so callers can explain the failure without
//! buffering arbitrarily large error pages.

pub mod links;
pub mod openai;
pub mod retry;

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
pub use resonance_types::{ApiKey, ModelName};

/// Canonical OpenAI API base URL.
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";

const CONNECT_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 16;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;
const MAX_LINK_REDIRECTS: usize = 5;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("API error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("Request failed after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("model returned no content (finish_reason: {finish_reason})")]
    EmptyCompletion { finish_reason: String },
}

impl ProviderError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn platform_headers() -> HeaderMap {
    let mut default_headers = HeaderMap::new();
    default_headers.insert("X-Stainless-Lang", HeaderValue::from_static("rust"));
    default_headers.insert(
        "X-Stainless-OS",
        HeaderValue::from_static(std::env::consts::OS),
    );
    default_headers.insert(
        "X-Stainless-Arch",
        HeaderValue::from_static(std::env::consts::ARCH),
    );
    default_headers
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(platform_headers())
}

/// Client for API calls: no redirects, HTTPS-only unless `base_url` is plain
/// `http://` (local mock servers).
pub fn api_client(base_url: &str, timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    base_client_builder()
        .redirect(reqwest::redirect::Policy::none())
        .https_only(!base_url.starts_with("http://"))
        .timeout(timeout)
        .build()
        .map_err(ProviderError::Client)
}

/// Client for link probing: follows a bounded number of redirects.
pub fn link_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    base_client_builder()
        .redirect(reqwest::redirect::Policy::limited(MAX_LINK_REDIRECTS))
        .timeout(timeout)
        .build()
        .map_err(ProviderError::Client)
}

/// Read at most 32 KiB of an error response body.
pub async fn read_capped_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Turn a retry outcome into a successful response or a [`ProviderError`].
pub(crate) async fn handle_response(
    outcome: retry::RetryOutcome,
) -> Result<reqwest::Response, ProviderError> {
    let response = match outcome {
        retry::RetryOutcome::Success(resp) | retry::RetryOutcome::HttpError(resp) => resp,
        retry::RetryOutcome::ConnectionError { attempts, source } => {
            return Err(ProviderError::Connection { attempts, source });
        }
        retry::RetryOutcome::NonRetryable(e) => return Err(ProviderError::Request(e)),
    };

    let status = response.status();
    if !status.is_success() {
        let body = read_capped_error_body(response).await;
        return Err(ProviderError::Api { status, body });
    }

    Ok(response)
}

/// Credentials and request knobs for the OpenAI client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    api_key: ApiKey,
    model: ModelName,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    retry: retry::RetryConfig,
}

impl ApiConfig {
    #[must_use]
    pub fn new(api_key: ApiKey, model: ModelName) -> Self {
        Self {
            api_key,
            model,
            base_url: OPENAI_API_BASE_URL.to_string(),
            max_tokens: 1500,
            temperature: 0.3,
            timeout: Duration::from_secs(120),
            retry: retry::RetryConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: retry::RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    #[must_use]
    pub fn model(&self) -> &ModelName {
        &self.model
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    #[must_use]
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn retry(&self) -> &retry::RetryConfig {
        &self.retry
    }
}
