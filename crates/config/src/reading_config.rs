//! Tracker platform settings

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use shelfsync_core::{BookKey, Platform};
use std::time::Duration;

/// Which tracker to read and who to read it for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReadingConfig {
    /// Selected tracker platform
    pub platform: Platform,

    /// Numeric Goodreads user id (the "12345" in `/user/show/12345-name`)
    pub goodreads_id: String,

    /// StoryGraph username
    pub storygraph_username: String,

    /// Optional `remember_user_token` cookie for private StoryGraph profiles
    pub storygraph_session_token: String,

    /// Last selected book; empty when nothing has been chosen yet
    pub current_book_key: String,

    /// How long a fetched book set stays fresh
    pub cache_ttl_secs: u64,
}

impl ReadingConfig {
    pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

    /// Identifier for the given platform, `None` when blank
    pub fn identifier(&self, platform: Platform) -> Option<&str> {
        let raw = match platform {
            Platform::Goodreads => &self.goodreads_id,
            Platform::StoryGraph => &self.storygraph_username,
        };
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Whether the selected platform has an identifier
    pub fn is_configured(&self) -> bool {
        self.identifier(self.platform).is_some()
    }

    /// Persisted sticky selection, if any
    pub fn current_key(&self) -> Option<BookKey> {
        BookKey::new(&self.current_book_key).ok()
    }

    /// StoryGraph session cookie value, if set
    pub fn session_token(&self) -> Option<&str> {
        let token = self.storygraph_session_token.trim();
        (!token.is_empty()).then_some(token)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            goodreads_id: String::new(),
            storygraph_username: String::new(),
            storygraph_session_token: String::new(),
            current_book_key: String::new(),
            cache_ttl_secs: Self::DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl ConfigSection for ReadingConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::identifier(self.goodreads_id.trim(), "reading.goodreads_id"),
            Validator::identifier(
                self.storygraph_username.trim(),
                "reading.storygraph_username",
            ),
            Validator::in_range(self.cache_ttl_secs, 1, 86_400, "reading.cache_ttl_secs"),
        ])
    }

    fn section_name(&self) -> &'static str {
        "reading"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unconfigured() {
        let config = ReadingConfig::default();
        assert_eq!(config.platform, Platform::Goodreads);
        assert!(!config.is_configured());
        assert_eq!(config.current_key(), None);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_identifier_follows_platform() {
        let config = ReadingConfig {
            platform: Platform::StoryGraph,
            goodreads_id: "12345".to_string(),
            storygraph_username: "  reader  ".to_string(),
            ..ReadingConfig::default()
        };

        assert_eq!(config.identifier(Platform::Goodreads), Some("12345"));
        assert_eq!(config.identifier(Platform::StoryGraph), Some("reader"));
        assert!(config.is_configured());
    }

    #[test]
    fn test_blank_identifier_is_not_configured() {
        let config = ReadingConfig {
            goodreads_id: "   ".to_string(),
            ..ReadingConfig::default()
        };
        assert!(!config.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let config = ReadingConfig {
            storygraph_username: "two words".to_string(),
            ..ReadingConfig::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "reading.storygraph_username");
    }

    #[test]
    fn test_current_key_and_token() {
        let config = ReadingConfig {
            current_book_key: "9780261103344".to_string(),
            storygraph_session_token: "tok".to_string(),
            ..ReadingConfig::default()
        };
        assert_eq!(
            config.current_key().map(|k| k.to_string()),
            Some("9780261103344".to_string())
        );
        assert_eq!(config.session_token(), Some("tok"));
    }
}
