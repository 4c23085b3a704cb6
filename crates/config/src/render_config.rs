//! Headless render fallback settings

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// WebDriver endpoint used when a tracker page refuses plain HTTP fetches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Base URL of a W3C WebDriver server (geckodriver, chromedriver, grid)
    pub webdriver_url: String,

    /// Cap on scroll-to-bottom passes while waiting for lazy content
    pub max_scroll_iterations: u32,

    /// Pause after each scroll
    pub scroll_wait_ms: u64,
}

impl RenderConfig {
    pub fn scroll_wait(&self) -> Duration {
        Duration::from_millis(self.scroll_wait_ms)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            max_scroll_iterations: 8,
            scroll_wait_ms: 750,
        }
    }
}

impl ConfigSection for RenderConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::http_url(&self.webdriver_url, "render.webdriver_url"),
            Validator::in_range(self.max_scroll_iterations, 1, 50, "render.max_scroll_iterations"),
            Validator::in_range(self.scroll_wait_ms, 0, 10_000, "render.scroll_wait_ms"),
        ])
    }

    fn section_name(&self) -> &'static str {
        "render"
    }
}
