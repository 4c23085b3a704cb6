//! Presence broadcasting settings

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lower bound for the presence update interval
pub const MIN_INTERVAL_SECS: u64 = 5;
/// Upper bound for the presence update interval
pub const MAX_INTERVAL_SECS: u64 = 600;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PresenceConfig {
    /// Discord application (client) id
    pub discord_app_id: String,

    /// Seconds between presence pushes; clamped when read
    pub update_interval_secs: u64,

    /// How long a broadcaster waits for the first successful fetch
    pub startup_gate_secs: u64,

    /// Wait after a failed reconnect before trying again
    pub reconnect_backoff_secs: u64,

    /// Image asset key used when a book has no cover
    pub placeholder_image: String,
}

impl PresenceConfig {
    /// Update interval clamped to `[MIN_INTERVAL_SECS, MAX_INTERVAL_SECS]`
    ///
    /// Stored values outside the range are kept as written; only the
    /// effective value is clamped.
    pub fn effective_interval(&self) -> Duration {
        Duration::from_secs(
            self.update_interval_secs
                .clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS),
        )
    }

    pub fn startup_gate(&self) -> Duration {
        Duration::from_secs(self.startup_gate_secs)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }

    /// Application id, `None` when blank
    pub fn app_id(&self) -> Option<&str> {
        let id = self.discord_app_id.trim();
        (!id.is_empty()).then_some(id)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            discord_app_id: String::new(),
            update_interval_secs: 15,
            startup_gate_secs: 10,
            reconnect_backoff_secs: 10,
            placeholder_image: "book".to_string(),
        }
    }
}

impl ConfigSection for PresenceConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::digits(self.discord_app_id.trim(), "presence.discord_app_id"),
            Validator::in_range(self.startup_gate_secs, 1, 120, "presence.startup_gate_secs"),
            Validator::in_range(
                self.reconnect_backoff_secs,
                1,
                300,
                "presence.reconnect_backoff_secs",
            ),
            Validator::not_empty(&self.placeholder_image, "presence.placeholder_image"),
        ])
    }

    fn section_name(&self) -> &'static str {
        "presence"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_presence_config() {
        let config = PresenceConfig::default();
        assert_eq!(config.effective_interval(), Duration::from_secs(15));
        assert_eq!(config.startup_gate(), Duration::from_secs(10));
        assert_eq!(config.app_id(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_interval_clamped_low() {
        let config = PresenceConfig {
            update_interval_secs: 0,
            ..PresenceConfig::default()
        };
        assert_eq!(config.effective_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_interval_clamped_high() {
        let config = PresenceConfig {
            update_interval_secs: 100_000,
            ..PresenceConfig::default()
        };
        assert_eq!(config.effective_interval(), Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_interval_in_range_unchanged() {
        let config = PresenceConfig {
            update_interval_secs: 42,
            ..PresenceConfig::default()
        };
        assert_eq!(config.effective_interval(), Duration::from_secs(42));
    }

    #[test]
    fn test_non_numeric_app_id_rejected() {
        let config = PresenceConfig {
            discord_app_id: "my-app".to_string(),
            ..PresenceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_gate_rejected() {
        let config = PresenceConfig {
            startup_gate_secs: 0,
            reconnect_backoff_secs: 1000,
            ..PresenceConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().len(), 2);
    }
}
