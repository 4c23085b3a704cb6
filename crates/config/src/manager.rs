//! Configuration manager - main API for config operations

use crate::error::join_errors;
use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use shelfsync_core::Platform;
use std::path::PathBuf;

/// Prefix of environment variables that override file values
pub const ENV_PREFIX: &str = "SHELFSYNC_";

/// File-backed configuration
///
/// Owns the config file path and applies `SHELFSYNC_*` environment overrides
/// on every load.
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager using the default config directory
    ///
    /// - Linux: `~/.config/shelfsync/`
    /// - macOS: `~/Library/Application Support/shelfsync/`
    /// - Windows: `%APPDATA%\shelfsync\config\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let persistence = ConfigPersistence::new(config_dir.join("config.toml"));

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "shelfsync")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Could not determine user config directory".to_string(),
            })
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.persistence.path().to_path_buf()
    }

    /// Loads the configuration file without environment overrides
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load_with_env_overrides() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                let mut config = Config::default();
                apply_env_overrides(&mut config, |name| std::env::var(name).ok());
                config.repair();
                config
            }
        }
    }

    /// Validates and atomically writes the configuration
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads the file, applies the closure and saves the result
    ///
    /// Environment overrides are not applied here, so they never leak into
    /// the file.
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if one doesn't exist
    ///
    /// Returns Ok(true) if a new file was created, Ok(false) if one already exists.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path().display());
        Ok(true)
    }

    /// Validates the current configuration file
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the file and merges `SHELFSYNC_SECTION_FIELD` overrides
    ///
    /// The result is always valid: fields that fail validation are replaced
    /// by their defaults with a warning.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok());

        let replaced = config.repair();
        if !replaced.is_empty() {
            log::warn!(
                "Using defaults for invalid config values: {}",
                join_errors(&replaced)
            );
        }

        Ok(config)
    }
}

/// Applies overrides read through `lookup`; unparseable values are logged and skipped
pub(crate) fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |field: &str| lookup(&format!("{}{}", ENV_PREFIX, field));

    if let Some(platform) = var("READING_PLATFORM") {
        match platform.parse::<Platform>() {
            Ok(p) => config.reading.platform = p,
            Err(e) => log::warn!("Ignoring {}READING_PLATFORM: {}", ENV_PREFIX, e),
        }
    }

    if let Some(id) = var("READING_GOODREADS_ID") {
        config.reading.goodreads_id = id;
    }

    if let Some(username) = var("READING_STORYGRAPH_USERNAME") {
        config.reading.storygraph_username = username;
    }

    if let Some(app_id) = var("PRESENCE_DISCORD_APP_ID") {
        config.presence.discord_app_id = app_id;
    }

    if let Some(interval) = var("PRESENCE_UPDATE_INTERVAL_SECS") {
        match interval.trim().parse::<u64>() {
            Ok(secs) => config.presence.update_interval_secs = secs,
            Err(_) => log::warn!(
                "Ignoring {}PRESENCE_UPDATE_INTERVAL_SECS={}: not a number",
                ENV_PREFIX,
                interval
            ),
        }
    }
}
