//! Logging setup and home directory layout for Tablewright.

mod rolling;

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use rolling::RotatingLog;

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "TABLEWRIGHT_HOME";

const DEFAULT_FILTER: &str = "tablewright=info,tablewright_db=info,tablewright_model=info";
const KEPT_LOG_FILES: usize = 5;
const LOG_FILE_LIMIT: u64 = 8 * 1024 * 1024;

/// Logging configuration for a Tablewright process.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Interactive sessions keep stderr quiet unless `verbose` is set.
    pub interactive: bool,
}

/// Send tracing output to `<home>/logs/<app>.log` and to stderr.
///
/// `RUST_LOG` replaces the file filter; stderr follows it only in verbose mode.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = create_logs_dir()?;
    let log_file = RotatingLog::open(&log_dir, config.app_name, KEPT_LOG_FILES, LOG_FILE_LIMIT)
        .with_context(|| format!("Failed to open log file for {}", config.app_name))?;

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_filter = if config.verbose {
        file_filter.clone()
    } else if config.interactive {
        EnvFilter::new("warn")
    } else {
        EnvFilter::new("error")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// The Tablewright home directory: `$TABLEWRIGHT_HOME`, else `~/.tablewright`.
///
/// Falls back to `./.tablewright` when no home directory can be determined.
pub fn tablewright_home() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tablewright")
}

/// Get the logs directory: `<home>/logs`
pub fn logs_dir() -> PathBuf {
    tablewright_home().join("logs")
}

/// Get the database directory: `<home>/db`
pub fn db_dir() -> PathBuf {
    tablewright_home().join("db")
}

/// Get the settings file: `<home>/settings.toml`
pub fn settings_path() -> PathBuf {
    tablewright_home().join("settings.toml")
}

fn create_logs_dir() -> Result<PathBuf> {
    let dir = logs_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
    Ok(dir)
}
