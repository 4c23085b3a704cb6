//! Headless rendering fallback
//!
//! Some tracker pages reject plain HTTP clients. [`PageRenderer`] loads a page
//! in a real browser instead; [`WebDriverRenderer`] drives any W3C WebDriver
//! server (geckodriver, chromedriver, Selenium grid) over its JSON protocol.

use crate::error::{ScrapeError, ScrapeResult};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use shelfsync_config::RenderConfig;
use shelfsync_network::Client;
use shelfsync_resilience::with_deadline;

/// Cookie injected into the browser before navigating
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    /// Origin the cookie belongs to, e.g. `https://app.thestorygraph.com`
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub url: String,
    pub cookie: Option<SessionCookie>,
}

/// Fully rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub html: String,
    /// URL the browser ended up on; login redirects show up here
    pub final_url: String,
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Loads the page, waits for lazy content and returns its HTML
    ///
    /// Implementations must terminate: content stabilization is bounded by
    /// `settings.max_scroll_iterations` and the whole render by a deadline.
    async fn render(
        &self,
        request: &RenderRequest,
        settings: &RenderConfig,
    ) -> ScrapeResult<RenderedPage>;
}

const SCROLL_SCRIPT: &str =
    "window.scrollTo(0, document.body.scrollHeight); return document.body.scrollHeight;";

/// Renderer backed by a W3C WebDriver endpoint
///
/// The whole render shares the HTTP client's fetch deadline. On expiry the
/// browser session is still deleted.
pub struct WebDriverRenderer {
    http: Client,
}

impl WebDriverRenderer {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    async fn command(
        &self,
        method: Method,
        url: String,
        body: Option<Value>,
    ) -> ScrapeResult<Value> {
        let response = self.http.send_json(method, &url, body.as_ref()).await?;
        Ok(response.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn create_session(&self, base: &str) -> ScrapeResult<String> {
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": { "args": ["--headless=new", "--disable-gpu"] },
                    "moz:firefoxOptions": { "args": ["-headless"] }
                }
            }
        });

        let value = self
            .command(Method::POST, format!("{}/session", base), Some(capabilities))
            .await?;

        value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ScrapeError::Render("WebDriver returned no session id".to_string()))
    }

    async fn run_session(
        &self,
        session: &str,
        request: &RenderRequest,
        settings: &RenderConfig,
    ) -> ScrapeResult<RenderedPage> {
        if let Some(cookie) = &request.cookie {
            // Cookies can only be set for the document's current origin
            self.command(
                Method::POST,
                format!("{}/url", session),
                Some(json!({ "url": cookie.origin })),
            )
            .await?;
            self.command(
                Method::POST,
                format!("{}/cookie", session),
                Some(json!({
                    "cookie": {
                        "name": cookie.name,
                        "value": cookie.value,
                        "path": "/",
                        "httpOnly": true,
                        "secure": cookie.origin.starts_with("https://"),
                    }
                })),
            )
            .await?;
        }

        self.command(
            Method::POST,
            format!("{}/url", session),
            Some(json!({ "url": request.url })),
        )
        .await?;

        let mut last_height: Option<i64> = None;
        for iteration in 1..=settings.max_scroll_iterations {
            let height = self
                .command(
                    Method::POST,
                    format!("{}/execute/sync", session),
                    Some(json!({ "script": SCROLL_SCRIPT, "args": [] })),
                )
                .await?
                .as_i64();

            if height.is_some() && height == last_height {
                log::debug!("Page height stable after {} scroll(s)", iteration);
                break;
            }
            last_height = height;
            tokio::time::sleep(settings.scroll_wait()).await;
        }

        let html = self
            .command(Method::GET, format!("{}/source", session), None)
            .await?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ScrapeError::Render("WebDriver returned no page source".to_string()))?;

        let final_url = self
            .command(Method::GET, format!("{}/url", session), None)
            .await?
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| request.url.clone());

        Ok(RenderedPage { html, final_url })
    }
}

#[async_trait]
impl PageRenderer for WebDriverRenderer {
    async fn render(
        &self,
        request: &RenderRequest,
        settings: &RenderConfig,
    ) -> ScrapeResult<RenderedPage> {
        let base = settings.webdriver_url.trim_end_matches('/');
        let deadline = self.http.config().deadline;
        let started = tokio::time::Instant::now();

        let session_id = with_deadline(deadline, self.create_session(base))
            .await
            .map_err(|e| ScrapeError::Fetch(e.into()))??;
        let session = format!("{}/session/{}", base, session_id);
        log::debug!("WebDriver session {} opened for {}", session_id, request.url);

        let remaining = deadline.saturating_sub(started.elapsed());
        let result = match with_deadline(remaining, self.run_session(&session, request, settings))
            .await
        {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Rendering {} gave up after {:?}", request.url, deadline);
                Err(ScrapeError::Fetch(e.into()))
            }
        };

        if let Err(e) = self.command(Method::DELETE, session, None).await {
            log::warn!("Failed to close WebDriver session {}: {}", session_id, e);
        }

        result
    }
}
