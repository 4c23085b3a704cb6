//! Snapshot-based access to configuration
//!
//! The sync engine reads configuration through [`ConfigStore`] so that tests
//! can run without touching the file system.

use crate::{Config, ConfigError, ConfigManager, ConfigResult};
use std::sync::{Arc, Mutex};

/// Source of configuration snapshots
pub trait ConfigStore: Send + Sync {
    /// Returns a copy of the current configuration
    fn snapshot(&self) -> ConfigResult<Config>;

    /// Loads, mutates and persists the configuration
    fn update(&self, apply: &mut dyn FnMut(&mut Config)) -> ConfigResult<()>;

    /// Replaces the stored configuration
    fn save(&self, config: &Config) -> ConfigResult<()>;
}

impl ConfigStore for ConfigManager {
    fn snapshot(&self) -> ConfigResult<Config> {
        self.load_with_env_overrides()
    }

    fn update(&self, apply: &mut dyn FnMut(&mut Config)) -> ConfigResult<()> {
        ConfigManager::update(self, |config| apply(config))
    }

    fn save(&self, config: &Config) -> ConfigResult<()> {
        ConfigManager::save(self, config)
    }
}

/// In-memory store, validated like the file store
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<Mutex<Config>>,
}

impl MemoryConfigStore {
    /// Wraps `config`, replacing invalid fields by their defaults
    pub fn new(mut config: Config) -> Self {
        let replaced = config.repair();
        if !replaced.is_empty() {
            log::warn!(
                "Using defaults for invalid config values: {}",
                crate::error::join_errors(&replaced)
            );
        }
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn snapshot(&self) -> ConfigResult<Config> {
        self.inner
            .lock()
            .map(|config| config.clone())
            .map_err(|_| ConfigError::LockPoisoned)
    }

    fn update(&self, apply: &mut dyn FnMut(&mut Config)) -> ConfigResult<()> {
        let mut guard = self.inner.lock().map_err(|_| ConfigError::LockPoisoned)?;
        let mut next = guard.clone();
        apply(&mut next);
        if let Err(errors) = next.validate() {
            return Err(ConfigError::ValidationError(crate::error::join_errors(
                &errors,
            )));
        }
        *guard = next;
        Ok(())
    }

    fn save(&self, config: &Config) -> ConfigResult<()> {
        if let Err(errors) = config.validate() {
            return Err(ConfigError::ValidationError(crate::error::join_errors(
                &errors,
            )));
        }
        let mut guard = self.inner.lock().map_err(|_| ConfigError::LockPoisoned)?;
        *guard = config.clone();
        Ok(())
    }
}
