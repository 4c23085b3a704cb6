use super::*;
use shelfsync_core::Platform;
use shelfsync_config::LogLevel;
use shelfsync_scrapers::ScrapeError;
use tempfile::TempDir;

fn set_matches(key: &str, value: &str) -> ArgMatches {
    let matches = crate::build_cli()
        .try_get_matches_from(["shelfsync", "config", "set", key, value])
        .unwrap();
    let (_, config) = matches.subcommand().unwrap();
    let (_, set) = config.subcommand().unwrap();
    set.clone()
}

#[test]
fn test_parse_control_commands() {
    assert_eq!(parse_control("refresh").unwrap(), Some(ControlCommand::Refresh));
    assert_eq!(parse_control("  R  ").unwrap(), Some(ControlCommand::Refresh));
    assert_eq!(
        parse_control("select 222").unwrap(),
        Some(ControlCommand::Select("222".to_string()))
    );
    assert_eq!(parse_control("clear-cache").unwrap(), Some(ControlCommand::ClearCache));
    assert_eq!(parse_control("quit").unwrap(), Some(ControlCommand::Quit));
    assert_eq!(parse_control("   ").unwrap(), None);
}

#[test]
fn test_parse_control_rejects_bad_input() {
    assert!(parse_control("select").is_err());
    assert!(parse_control("dance").is_err());
}

#[test]
fn test_apply_reading_settings() {
    let mut config = Config::default();
    apply_setting(&mut config, "reading.platform", "storygraph").unwrap();
    apply_setting(&mut config, "reading.storygraph_username", "  reader ").unwrap();
    apply_setting(&mut config, "reading.cache_ttl_secs", "600").unwrap();

    assert_eq!(config.reading.platform, Platform::StoryGraph);
    assert_eq!(config.reading.storygraph_username, "reader");
    assert_eq!(config.reading.cache_ttl_secs, 600);
}

#[test]
fn test_apply_presence_and_app_settings() {
    let mut config = Config::default();
    apply_setting(&mut config, "presence.discord_app_id", "1234567890").unwrap();
    apply_setting(&mut config, "presence.update_interval_secs", "1").unwrap();
    apply_setting(&mut config, "app.log_level", "debug").unwrap();
    apply_setting(&mut config, "app.minimize_to_tray", "yes").unwrap();

    assert_eq!(config.presence.app_id(), Some("1234567890"));
    assert_eq!(config.presence.effective_interval().as_secs(), 5);
    assert_eq!(config.app.log_level, LogLevel::Debug);
    assert!(config.app.minimize_to_tray);
}

#[test]
fn test_apply_setting_errors() {
    let mut config = Config::default();
    assert!(apply_setting(&mut config, "reading.platform", "kindle").is_err());
    assert!(apply_setting(&mut config, "reading.cache_ttl_secs", "soon").is_err());
    assert!(apply_setting(&mut config, "app.start_on_startup", "maybe").is_err());
    assert!(apply_setting(&mut config, "reading.colour", "red").is_err());
    assert_eq!(config, Config::default());
}

#[test]
fn test_every_listed_setting_is_known() {
    for key in SETTINGS {
        let err = apply_setting(&mut Config::default(), key, "")
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(!err.contains("Unknown setting"), "{} rejected as unknown", key);
    }
}

#[test]
fn test_config_set_persists() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();

    config_set(&manager, &set_matches("reading.goodreads_id", "12345")).unwrap();

    let config = manager.load().unwrap();
    assert_eq!(config.reading.goodreads_id, "12345");
}

#[test]
fn test_config_set_rejects_invalid_value() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();
    config_init(&manager).unwrap();

    let result = config_set(&manager, &set_matches("reading.goodreads_id", "not/valid"));
    assert!(result.is_err());
    assert_eq!(manager.load().unwrap().reading.goodreads_id, "");
}

#[test]
fn test_error_response_shape() {
    let err = EngineError::from(ScrapeError::AuthRequired(Platform::StoryGraph));
    let response = error_response(&err);

    assert_eq!(response["ok"], false);
    assert_eq!(response["error"]["code"], "auth_required");
    assert!(response["error"]["message"]
        .as_str()
        .unwrap()
        .contains("The StoryGraph"));
}

#[test]
fn test_status_reads_without_network() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();
    assert!(show_status(&manager, Output::Json).is_ok());
}
