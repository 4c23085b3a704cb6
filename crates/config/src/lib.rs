//! shelfsync configuration system
//!
//! Settings live in a single TOML file written atomically. The sync engine
//! never touches the file directly: it reads validated snapshots through the
//! [`ConfigStore`] trait, which both the file-backed [`ConfigManager`] and the
//! in-memory [`MemoryConfigStore`] implement.
//!
//! # Example
//!
//! ```rust,no_run
//! use shelfsync_config::{ConfigManager, ConfigStore};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.snapshot().unwrap_or_default();
//! println!("Interval: {:?}", config.presence.effective_interval());
//! ```

mod error;
mod manager;
mod persistence;
mod store;
mod validation;

// Config sections
pub mod app_config;
mod presence_config;
mod reading_config;
mod render_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use store::{ConfigStore, MemoryConfigStore};
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use presence_config::{PresenceConfig, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};
pub use reading_config::ReadingConfig;
pub use render_config::RenderConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Tracker platform selection and identifiers
    pub reading: ReadingConfig,

    /// Presence broadcasting settings
    pub presence: PresenceConfig,

    /// Headless render fallback settings
    pub render: RenderConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        collect_section(&self.app, &mut errors);
        collect_section(&self.reading, &mut errors);
        collect_section(&self.presence, &mut errors);
        collect_section(&self.render, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Resets every invalid field to its default value
    ///
    /// Returns the problems that were replaced; an empty list means the
    /// config was already valid. Afterwards `validate()` always succeeds.
    pub fn repair(&mut self) -> Vec<ValidationError> {
        let Err(errors) = self.validate() else {
            return Vec::new();
        };

        let defaults = Config::default();
        for error in &errors {
            self.reset_field(&error.field, &defaults);
        }

        if self.validate().is_err() {
            *self = defaults;
        }
        errors
    }

    fn reset_field(&mut self, field: &str, defaults: &Config) {
        match field {
            "reading.goodreads_id" => {
                self.reading.goodreads_id = defaults.reading.goodreads_id.clone()
            }
            "reading.storygraph_username" => {
                self.reading.storygraph_username = defaults.reading.storygraph_username.clone()
            }
            "reading.cache_ttl_secs" => {
                self.reading.cache_ttl_secs = defaults.reading.cache_ttl_secs
            }
            "presence.discord_app_id" => {
                self.presence.discord_app_id = defaults.presence.discord_app_id.clone()
            }
            "presence.startup_gate_secs" => {
                self.presence.startup_gate_secs = defaults.presence.startup_gate_secs
            }
            "presence.reconnect_backoff_secs" => {
                self.presence.reconnect_backoff_secs = defaults.presence.reconnect_backoff_secs
            }
            "presence.placeholder_image" => {
                self.presence.placeholder_image = defaults.presence.placeholder_image.clone()
            }
            "render.webdriver_url" => {
                self.render.webdriver_url = defaults.render.webdriver_url.clone()
            }
            "render.max_scroll_iterations" => {
                self.render.max_scroll_iterations = defaults.render.max_scroll_iterations
            }
            "render.scroll_wait_ms" => self.render.scroll_wait_ms = defaults.render.scroll_wait_ms,
            other => match other.split('.').next() {
                Some("app") => self.app = defaults.app.clone(),
                Some("reading") => self.reading = defaults.reading.clone(),
                Some("presence") => self.presence = defaults.presence.clone(),
                Some("render") => self.render = defaults.render.clone(),
                _ => {}
            },
        }
    }
}

fn collect_section(section: &impl ConfigSection, errors: &mut Vec<ValidationError>) {
    if let Err(mut e) = section.validate() {
        log::debug!(
            "Section [{}] has {} invalid field(s)",
            section.section_name(),
            e.len()
        );
        errors.append(&mut e);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            reading: ReadingConfig::default(),
            presence: PresenceConfig::default(),
            render: RenderConfig::default(),
        }
    }
}
