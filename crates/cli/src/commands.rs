// FILE: crates/cli/src/commands.rs

use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use console::style;
use serde_json::{json, Value};
use shelfsync_config::{Config, ConfigManager};
use shelfsync_core::{Book, BookKey, StatusEvent, StatusKind, Timestamp};
use shelfsync_sync_engine::{EngineError, StartOutcome, StopOutcome, SyncEngine};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, interval_at, Instant};

#[cfg(test)]
mod tests;

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Human,
    /// One JSON object per command on stdout
    Json,
}

/// Prints a structured error in JSON mode, then hands the error back
fn fail(output: Output, err: EngineError) -> Result<()> {
    if output == Output::Json {
        print_json(&error_response(&err))?;
    }
    Err(err.into())
}

pub(crate) fn error_response(err: &EngineError) -> Value {
    json!({
        "ok": false,
        "error": { "code": err.code(), "message": err.to_string() },
    })
}

fn print_json(value: &Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to encode response")?
    );
    Ok(())
}

/// Fetch the currently-reading list and reconcile the selection
pub async fn refresh_books(engine: &SyncEngine, output: Output) -> Result<()> {
    let outcome = match engine.refresh_books().await {
        Ok(outcome) => outcome,
        Err(e) => return fail(output, e),
    };

    match output {
        Output::Json => print_json(&json!({
            "ok": true,
            "books": outcome.books.iter().collect::<Vec<_>>(),
            "current_key": outcome.current_key,
            "from_cache": outcome.from_cache,
        })),
        Output::Human => {
            let platform = outcome
                .books
                .platform()
                .map(|p| p.label())
                .unwrap_or("tracker");
            println!(
                "\n{} Currently Reading on {}",
                style(outcome.books.len()).bold().cyan(),
                platform
            );
            println!("{}", "=".repeat(80));

            for book in outcome.books.iter() {
                let current = outcome.current_key.as_ref() == Some(&book.key);
                print_book_summary(book, current);
            }
            Ok(())
        }
    }
}

/// Make a book the current one
pub async fn select_book(engine: &SyncEngine, matches: &ArgMatches, output: Output) -> Result<()> {
    let key = matches
        .get_one::<String>("key")
        .ok_or_else(|| anyhow!("Book key is required"))?;

    if let Err(e) = engine.refresh_books().await {
        return fail(output, e);
    }

    let book = match engine.select_book(key) {
        Ok(book) => book,
        Err(e) => return fail(output, e),
    };

    match output {
        Output::Json => print_json(&json!({ "ok": true, "book": book })),
        Output::Human => {
            println!("{} Now reading {}", style("✓").green().bold(), book.display_label());
            Ok(())
        }
    }
}

/// Show the current book in detail
pub async fn show_current(engine: &SyncEngine, output: Output) -> Result<()> {
    if let Err(e) = engine.refresh_books().await {
        return fail(output, e);
    }

    let book = match engine.current_book() {
        Ok(book) => book,
        Err(e) => return fail(output, e),
    };

    match (output, book) {
        (Output::Json, book) => print_json(&json!({ "ok": true, "book": book })),
        (Output::Human, None) => {
            println!("No book selected.");
            Ok(())
        }
        (Output::Human, Some(book)) => {
            print_book_details(&book);
            Ok(())
        }
    }
}

/// Summarize configuration and readiness without touching the network
pub fn show_status(manager: &ConfigManager, output: Output) -> Result<()> {
    let config = manager
        .load_with_env_overrides()
        .context("Failed to load configuration")?;
    let platform = config.reading.platform;
    let identifier = config.reading.identifier(platform);
    let warnings: Vec<String> = match config.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };

    if output == Output::Json {
        return print_json(&json!({
            "ok": true,
            "platform": platform,
            "identifier": identifier,
            "current_book_key": config.reading.current_key(),
            "discord_app_id_set": config.presence.app_id().is_some(),
            "update_interval_secs": config.presence.effective_interval().as_secs(),
            "cache_ttl_secs": config.reading.cache_ttl().as_secs(),
            "config_path": manager.config_path(),
            "warnings": warnings,
        }));
    }

    println!("\n{}", style("ShelfSync Status").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Platform: {}", platform.label());
    match identifier {
        Some(id) => println!("User: {}", id),
        None => println!("User: {}", style("not configured").yellow()),
    }
    match config.reading.current_key() {
        Some(key) => println!("Current book: {}", key),
        None => println!("Current book: none"),
    }
    match config.presence.app_id() {
        Some(_) => println!("Discord app: configured"),
        None => println!("Discord app: {}", style("not configured").yellow()),
    }
    println!(
        "Update interval: {}s",
        config.presence.effective_interval().as_secs()
    );
    println!("Cache TTL: {}s", config.reading.cache_ttl().as_secs());
    println!("Config file: {}", manager.config_path().display());

    for warning in &warnings {
        println!("{} {}", style("!").yellow().bold(), warning);
    }
    Ok(())
}

/// A command typed while `run` is active
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ControlCommand {
    Refresh,
    Select(String),
    Current,
    Status,
    Start,
    Stop,
    ClearCache,
    Help,
    Quit,
}

pub(crate) fn parse_control(line: &str) -> Result<Option<ControlCommand>> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Ok(None);
    };
    let rest = parts.collect::<Vec<_>>().join(" ");

    let command = match word.to_ascii_lowercase().as_str() {
        "refresh" | "r" => ControlCommand::Refresh,
        "select" | "s" if !rest.is_empty() => ControlCommand::Select(rest),
        "select" | "s" => bail!("Usage: select <KEY>"),
        "current" | "c" => ControlCommand::Current,
        "status" => ControlCommand::Status,
        "start" => ControlCommand::Start,
        "stop" => ControlCommand::Stop,
        "clear-cache" => ControlCommand::ClearCache,
        "help" | "?" => ControlCommand::Help,
        "quit" | "exit" | "q" => ControlCommand::Quit,
        other => bail!("Unknown command '{}'; type 'help'", other),
    };
    Ok(Some(command))
}

const CONTROL_HELP: &str = "\
  refresh        fetch the currently-reading list
  select <KEY>   make a book current
  current        show the current book
  status         show presence state
  start | stop   start or stop presence
  clear-cache    force the next refresh to fetch
  quit           stop and exit";

/// Applies one control command; returns `true` when the loop should exit
async fn handle_control(engine: &SyncEngine, command: ControlCommand) -> Result<bool> {
    match command {
        ControlCommand::Refresh => {
            if let Ok(outcome) = engine.refresh_books().await {
                for book in outcome.books.iter() {
                    print_book_summary(book, outcome.current_key.as_ref() == Some(&book.key));
                }
            }
        }
        ControlCommand::Select(key) => {
            if let Ok(book) = engine.select_book(&key) {
                println!("{} Now reading {}", style("✓").green().bold(), book.display_label());
            }
        }
        ControlCommand::Current => match engine.current_book()? {
            Some(book) => print_book_details(&book),
            None => println!("No book selected."),
        },
        ControlCommand::Status => {
            let presence = engine.presence_state()?;
            println!(
                "Presence: {} (should run: {})",
                presence.state, presence.should_run
            );
        }
        ControlCommand::Start => {
            if engine.start_presence()? == StartOutcome::AlreadyRunning {
                println!("Presence is already running.");
            }
        }
        ControlCommand::Stop => {
            if engine.stop_presence()? == StopOutcome::NotRunning {
                println!("Presence is not running.");
            }
        }
        ControlCommand::ClearCache => engine.clear_cache()?,
        ControlCommand::Help => println!("{}", CONTROL_HELP),
        ControlCommand::Quit => return Ok(true),
    }
    Ok(false)
}

/// Keep presence in sync until Ctrl-C or `quit`
///
/// Refreshes once up front, then every cache TTL, and prints status events
/// as they arrive. Commands typed on stdin drive the engine directly.
pub async fn run(engine: &SyncEngine) -> Result<()> {
    println!(
        "{} ShelfSync running. Type 'help' for commands, Ctrl-C to quit.",
        style("▶").green().bold()
    );

    // Failures land in the status log and are printed below.
    let _ = engine.refresh_books().await;
    engine
        .start_presence()
        .context("Failed to start presence")?;

    let ttl = engine
        .config()
        .map(|config| config.reading.cache_ttl())
        .unwrap_or(Duration::from_secs(300));
    let mut refresh_timer = interval_at(Instant::now() + ttl, ttl);
    let mut poll = interval(Duration::from_secs(1));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = poll.tick() => print_events(&engine.drain_status()?),
            _ = refresh_timer.tick() => {
                let _ = engine.refresh_books().await;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_control(&line) {
                    Ok(Some(command)) => {
                        if handle_control(engine, command).await? {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{} {}", style("✗").red().bold(), e),
                },
                Ok(None) | Err(_) => stdin_open = false,
            },
        }
    }

    println!("Stopping...");
    engine.shutdown().await.context("Failed to stop presence")?;
    print_events(&engine.drain_status()?);
    Ok(())
}

/// Write a default config file
pub fn config_init(manager: &ConfigManager) -> Result<()> {
    let created = manager
        .initialize()
        .context("Failed to write default configuration")?;
    if created {
        println!(
            "{} Created {}",
            style("✓").green().bold(),
            manager.config_path().display()
        );
    } else {
        println!("Config already exists at {}", manager.config_path().display());
    }
    Ok(())
}

/// Print the effective configuration as TOML
pub fn config_show(manager: &ConfigManager) -> Result<()> {
    let config = manager
        .load_with_env_overrides()
        .context("Failed to load configuration")?;
    let text = toml::to_string_pretty(&config).context("Failed to encode configuration")?;
    print!("{}", text);
    Ok(())
}

pub fn config_path(manager: &ConfigManager) -> Result<()> {
    println!("{}", manager.config_path().display());
    Ok(())
}

/// Change one setting and save
pub fn config_set(manager: &ConfigManager, matches: &ArgMatches) -> Result<()> {
    let key = matches
        .get_one::<String>("key")
        .ok_or_else(|| anyhow!("Setting name is required"))?;
    let value = matches
        .get_one::<String>("value")
        .ok_or_else(|| anyhow!("Setting value is required"))?;

    let mut config = manager.load().context("Failed to load configuration")?;
    apply_setting(&mut config, key, value)?;
    manager
        .save(&config)
        .with_context(|| format!("Failed to save {}", key))?;

    println!("{} {} = {}", style("✓").green().bold(), key, value);
    Ok(())
}

/// Names accepted by `config set`
pub(crate) const SETTINGS: &[&str] = &[
    "app.log_level",
    "app.minimize_to_tray",
    "app.start_on_startup",
    "reading.platform",
    "reading.goodreads_id",
    "reading.storygraph_username",
    "reading.storygraph_session_token",
    "reading.current_book_key",
    "reading.cache_ttl_secs",
    "presence.discord_app_id",
    "presence.update_interval_secs",
    "presence.startup_gate_secs",
    "presence.reconnect_backoff_secs",
    "presence.placeholder_image",
    "render.webdriver_url",
    "render.max_scroll_iterations",
    "render.scroll_wait_ms",
];

pub(crate) fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let text = value.trim().to_string();

    match key {
        "app.log_level" => config.app.log_level = text.parse().map_err(|e: String| anyhow!(e))?,
        "app.minimize_to_tray" => config.app.minimize_to_tray = parse_bool(&text)?,
        "app.start_on_startup" => config.app.start_on_startup = parse_bool(&text)?,
        "reading.platform" => {
            config.reading.platform = text.parse().context("Invalid platform")?;
        }
        "reading.goodreads_id" => config.reading.goodreads_id = text,
        "reading.storygraph_username" => config.reading.storygraph_username = text,
        "reading.storygraph_session_token" => config.reading.storygraph_session_token = text,
        "reading.current_book_key" => {
            if !text.is_empty() {
                BookKey::new(&text).context("Invalid book key")?;
            }
            config.reading.current_book_key = text;
        }
        "reading.cache_ttl_secs" => config.reading.cache_ttl_secs = parse_number(key, &text)?,
        "presence.discord_app_id" => config.presence.discord_app_id = text,
        "presence.update_interval_secs" => {
            config.presence.update_interval_secs = parse_number(key, &text)?;
        }
        "presence.startup_gate_secs" => {
            config.presence.startup_gate_secs = parse_number(key, &text)?;
        }
        "presence.reconnect_backoff_secs" => {
            config.presence.reconnect_backoff_secs = parse_number(key, &text)?;
        }
        "presence.placeholder_image" => config.presence.placeholder_image = text,
        "render.webdriver_url" => config.render.webdriver_url = text,
        "render.max_scroll_iterations" => {
            config.render.max_scroll_iterations = parse_number(key, &text)?;
        }
        "render.scroll_wait_ms" => config.render.scroll_wait_ms = parse_number(key, &text)?,
        _ => bail!(
            "Unknown setting '{}'. Known settings: {}",
            key,
            SETTINGS.join(", ")
        ),
    }
    Ok(())
}

fn parse_bool(text: &str) -> Result<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => bail!("Expected true or false, got '{}'", other),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, text: &str) -> Result<T> {
    text.parse()
        .map_err(|_| anyhow!("{} expects a whole number, got '{}'", key, text))
}

// Helper functions

fn print_book_summary(book: &Book, current: bool) {
    let marker = if current {
        style("▶").green().bold().to_string()
    } else {
        " ".to_string()
    };
    println!(
        "{} {} {}",
        marker,
        style(&book.title).bold(),
        style(format!("by {}", book.author)).dim()
    );
    println!("    Key: {}", book.key);
    if let Some(series) = &book.series {
        match &series.position {
            Some(position) => println!("    Series: {} #{}", series.name, position),
            None => println!("    Series: {}", series.name),
        }
    }
}

fn print_book_details(book: &Book) {
    println!("\n{}", style("Current Book").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Title: {}", style(&book.title).bold());
    println!("Author: {}", book.author);
    println!("Key: {}", book.key);
    println!("Platform: {}", book.platform.label());
    if let Some(series) = &book.series {
        println!("Series: {}", series.name);
        if let Some(position) = &series.position {
            println!("Position: {}", position);
        }
    }
    if let Some(started) = &book.start_date {
        match book.started_at() {
            Some(secs) => println!(
                "Started: {} ({})",
                started,
                Timestamp::from_millis(secs * 1000)
            ),
            None => println!("Started: {}", started),
        }
    }
    if let Some(url) = &book.book_url {
        println!("Link: {}", url);
    }
    if let Some(cover) = &book.cover_art {
        println!("Cover: {}", cover);
    }
}

fn print_events(events: &[StatusEvent]) {
    for event in events.iter().filter(|e| !e.is_idle()) {
        let tag = match event.kind {
            StatusKind::Error => style("error").red().bold(),
            StatusKind::Active => style("active").green(),
            StatusKind::Info => style("info").cyan(),
            StatusKind::Idle => style("idle").dim(),
        };
        println!(
            "{} [{}] {}",
            style(event.timestamp).dim(),
            tag,
            event.message.as_deref().unwrap_or("")
        );
    }
}
