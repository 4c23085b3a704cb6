//! File system persistence for configuration
//!
//! Writes go through a temporary file in the same directory followed by an
//! atomic rename, and the previous file is kept as `config.toml.backup`.

use crate::error::join_errors;
use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Handles configuration file persistence
pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    /// Creates a new persistence handler for the given config file path
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    ///
    /// A missing file yields the defaults. An empty or unparseable file is an
    /// error. Validation problems are logged but do not fail the load, so a
    /// user can still fix the file through the application.
    pub fn load(&self) -> ConfigResult<Config> {
        if !self.config_path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        let contents =
            fs::read_to_string(&self.config_path).map_err(|e| ConfigError::ReadError {
                path: self.config_path.clone(),
                source: e,
            })?;

        if contents.trim().is_empty() {
            return Err(ConfigError::ReadError {
                path: self.config_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Config file is empty or contains only whitespace",
                ),
            });
        }

        let mut config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: self.config_path.clone(),
                source: e,
            })?;

        if config.version != CONFIG_VERSION {
            log::warn!(
                "Config version {} differs from supported version {}, reading it as-is",
                config.version,
                CONFIG_VERSION
            );
            config.version = CONFIG_VERSION;
        }

        if let Err(errors) = config.validate() {
            log::warn!("Config validation warnings: {}", join_errors(&errors));
        }

        Ok(config)
    }

    /// Validates, backs up the previous file and atomically replaces it
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        if let Err(errors) = config.validate() {
            return Err(ConfigError::ValidationError(join_errors(&errors)));
        }

        let dir = self.parent_dir()?;
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| ConfigError::write(dir, e))?;
            log::info!("Created config directory: {}", dir.display());
        }

        if self.config_path.exists() {
            let backup_path = self.config_path.with_extension("toml.backup");
            fs::copy(&self.config_path, &backup_path)
                .map_err(|e| ConfigError::write(&backup_path, e))?;
            log::debug!("Backed up config to {}", backup_path.display());
        }

        let contents = toml::to_string_pretty(config).map_err(ConfigError::SerializeError)?;

        let mut staged = NamedTempFile::new_in(dir).map_err(|e| ConfigError::write(dir, e))?;
        staged
            .write_all(contents.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(|e| ConfigError::write(staged.path(), e))?;
        staged
            .persist(&self.config_path)
            .map_err(|e| ConfigError::write(&self.config_path, e.error))?;

        log::info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    fn parent_dir(&self) -> ConfigResult<&Path> {
        self.config_path
            .parent()
            .map(|dir| {
                if dir.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    dir
                }
            })
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: format!("{} has no parent directory", self.config_path.display()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_dir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        (temp_dir, config_path)
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let config = persistence.load().expect("Should load default config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load_keeps_selection() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let mut config = Config::default();
        config.reading.goodreads_id = "12345".to_string();
        config.reading.current_book_key = "9780261103344".to_string();

        persistence.save(&config).expect("Should save config");
        let loaded = persistence.load().expect("Should load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("subdir").join("config.toml");
        let persistence = ConfigPersistence::new(config_path.clone());

        persistence
            .save(&Config::default())
            .expect("Should create directory and save");

        assert!(config_path.exists());
    }

    #[test]
    fn test_backup_created_on_overwrite() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path.clone());

        persistence.save(&Config::default()).expect("Should save");
        persistence.save(&Config::default()).expect("Should save again");

        assert!(config_path.with_extension("toml.backup").exists());
    }

    #[test]
    fn test_unparseable_file_is_parse_error() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "this is not valid TOML {{{").expect("Should write file");

        let result = ConfigPersistence::new(config_path).load();
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_empty_file_is_read_error() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "   \n").expect("Should write file");

        let result = ConfigPersistence::new(config_path).load();
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_invalid_values_load_but_do_not_save() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(
            &config_path,
            "[presence]\ndiscord_app_id = \"not-a-number\"\n",
        )
        .expect("Should write file");
        let persistence = ConfigPersistence::new(config_path);

        let loaded = persistence.load().expect("Invalid values still load");
        assert_eq!(loaded.presence.discord_app_id, "not-a-number");

        let result = persistence.save(&loaded);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
