// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use commands::Output;
use shelfsync_config::{ConfigManager, ConfigStore};
use shelfsync_network::Client;
use shelfsync_presence::DiscordIpcConnector;
use shelfsync_scrapers::PlatformClients;
use shelfsync_sync_engine::SyncEngine;
use std::path::PathBuf;
use std::sync::Arc;

mod commands;

fn build_cli() -> Command {
    Command::new("shelfsync")
        .version(env!("CARGO_PKG_VERSION"))
        .author("DrTomLLC")
        .about("Shows the book you are reading on Goodreads or The StoryGraph as Discord rich presence")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print results as JSON")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("refresh").about("Fetch your currently-reading list"))
        .subcommand(
            Command::new("select")
                .about("Choose which book to show")
                .arg(Arg::new("key").required(true).value_name("KEY").help("Book key from 'refresh'")),
        )
        .subcommand(Command::new("current").about("Show the current book"))
        .subcommand(Command::new("status").about("Show configuration and readiness"))
        .subcommand(Command::new("run").about("Keep Discord presence in sync until Ctrl-C"))
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config file"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the config file location"))
                .subcommand(
                    Command::new("set")
                        .about("Change one setting, e.g. reading.goodreads_id 12345")
                        .arg(Arg::new("key").required(true).value_name("SETTING"))
                        .arg(Arg::new("value").required(true).value_name("VALUE")),
                ),
        )
}

fn config_manager(matches: &ArgMatches) -> Result<ConfigManager> {
    let manager = match matches.get_one::<String>("config-dir") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    };
    manager.context("Failed to locate configuration directory")
}

fn init_logging(manager: &ConfigManager) {
    let level = manager.load_or_default().app.log_level;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.to_string()))
        .init();
}

fn build_engine(manager: ConfigManager) -> Result<SyncEngine> {
    let http = Client::new().context("Failed to create HTTP client")?;
    let store: Arc<dyn ConfigStore> = Arc::new(manager);
    SyncEngine::new(
        store,
        PlatformClients::builtin(http),
        Arc::new(DiscordIpcConnector::new()),
    )
    .context("Failed to start sync engine")
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let manager = config_manager(&matches)?;
    init_logging(&manager);

    let output = if matches.get_flag("json") {
        Output::Json
    } else {
        Output::Human
    };

    match matches.subcommand() {
        Some(("refresh", _)) => commands::refresh_books(&build_engine(manager)?, output).await,
        Some(("select", sub_matches)) => {
            commands::select_book(&build_engine(manager)?, sub_matches, output).await
        }
        Some(("current", _)) => commands::show_current(&build_engine(manager)?, output).await,
        Some(("status", _)) => commands::show_status(&manager, output),
        Some(("run", _)) => commands::run(&build_engine(manager)?).await,
        Some(("config", sub_matches)) => match sub_matches.subcommand() {
            Some(("init", _)) => commands::config_init(&manager),
            Some(("show", _)) => commands::config_show(&manager),
            Some(("path", _)) => commands::config_path(&manager),
            Some(("set", set_matches)) => commands::config_set(&manager, set_matches),
            _ => Ok(()),
        },
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_global_flags_reach_subcommands() {
        let matches = build_cli()
            .try_get_matches_from(["shelfsync", "select", "111", "--json", "-c", "/tmp/shelf"])
            .unwrap();
        assert!(matches.get_flag("json"));
        assert_eq!(
            matches.get_one::<String>("config-dir").map(String::as_str),
            Some("/tmp/shelf")
        );
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "select");
        assert_eq!(sub.get_one::<String>("key").map(String::as_str), Some("111"));
    }

    #[test]
    fn test_config_set_requires_value() {
        let result = build_cli().try_get_matches_from(["shelfsync", "config", "set", "reading.platform"]);
        assert!(result.is_err());
    }
}
