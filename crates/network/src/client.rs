// crates/network/src/client.rs
//! HTTP client wrapper with resilience

use crate::error::{NetworkError, NetworkResult};
use reqwest::{Client as ReqwestClient, Method, Url};
use shelfsync_resilience::{retry_async, with_deadline, RetryPolicy};
use std::time::Duration;

/// Statuses worth retrying; everything else fails on the first answer
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout of a single request
    pub request_timeout: Duration,
    /// Hard upper bound on a page fetch including all retries
    pub deadline: Duration,
    /// User agent string
    pub user_agent: String,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Retry policy for page fetches
    pub retry_policy: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            deadline: Duration::from_secs(30),
            user_agent: format!(
                "Mozilla/5.0 (compatible; shelfsync/{})",
                env!("CARGO_PKG_VERSION")
            ),
            max_redirects: 10,
            retry_policy: RetryPolicy::new(3).with_initial_delay(Duration::from_millis(500)),
        }
    }
}

/// A fetched HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    /// URL after redirects; used to spot login walls
    pub final_url: String,
    pub body: String,
}

/// HTTP client with resilience features
#[derive(Clone)]
pub struct Client {
    inner: ReqwestClient,
    config: ClientConfig,
}

impl Client {
    /// Creates a new client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self {
            inner: client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetches a page
    pub async fn get(&self, url: &str) -> NetworkResult<FetchedPage> {
        self.get_with_headers(url, &[]).await
    }

    /// Fetches a page with extra request headers (cookies, language)
    ///
    /// Retries only statuses in [`RETRYABLE_STATUSES`], with backoff, and
    /// gives up once the configured deadline passes regardless of attempts.
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, String)],
    ) -> NetworkResult<FetchedPage> {
        let parsed = Url::parse(url).map_err(|_| NetworkError::InvalidUrl(url.to_string()))?;
        let parsed = &parsed;

        with_deadline(
            self.config.deadline,
            retry_async(
                &self.config.retry_policy,
                NetworkError::is_retryable,
                move |attempt| self.get_once(parsed, headers, attempt),
            ),
        )
        .await?
    }

    async fn get_once(
        &self,
        url: &Url,
        headers: &[(&str, String)],
        attempt: usize,
    ) -> NetworkResult<FetchedPage> {
        log::debug!("GET {} (attempt {})", url, attempt);

        let mut request = self.inner.get(url.clone());
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await.map_err(NetworkError::from_reqwest)?;
        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(NetworkError::Status {
                status: status.as_u16(),
                url: final_url,
            });
        }

        let body = response.text().await.map_err(NetworkError::from_reqwest)?;

        Ok(FetchedPage {
            status: status.as_u16(),
            final_url,
            body,
        })
    }

    /// Sends a JSON request once, without retry, returning the JSON answer
    ///
    /// Used for non-idempotent calls such as creating a WebDriver session.
    pub async fn send_json(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> NetworkResult<serde_json::Value> {
        let parsed = Url::parse(url).map_err(|_| NetworkError::InvalidUrl(url.to_string()))?;

        let mut request = self.inner.request(method, parsed);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(NetworkError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let text = response.text().await.map_err(NetworkError::from_reqwest)?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
