//! Shared logging setup for the Chanflow binaries.
//!
//! Every process logs to stderr and to a daily-rolled file under
//! `~/.chanflow/logs/<app>.<date>.log` (override the root with
//! `CHANFLOW_HOME`). Filtering follows `RUST_LOG` when set.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str =
    "chanflow_coordinator=info,chanflow_worker=info,chanflow_db=info,chanflow_broker=info";
const VERBOSE_LOG_FILTER: &str =
    "chanflow_coordinator=debug,chanflow_worker=debug,chanflow_db=debug,chanflow_broker=debug";
const MAX_LOG_FILES: usize = 5;

pub struct LogConfig<'a> {
    /// Base name of the log file, e.g. `worker-7f3a`
    pub app_name: &'a str,
    /// Raise chanflow crates to debug on the console
    pub verbose: bool,
    /// Overrides `~/.chanflow/logs`
    pub log_dir: Option<PathBuf>,
}

/// Install the global subscriber. Call once, at process start.
///
/// The returned guard flushes the file writer on drop; hold it for the life
/// of the process.
pub fn init_logging(config: LogConfig<'_>) -> Result<WorkerGuard> {
    let log_dir = match config.log_dir {
        Some(dir) => dir,
        None => logs_dir(),
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create logs directory: {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_stem(config.app_name))
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(&log_dir)
        .with_context(|| format!("Failed to open log file for {}", config.app_name))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Global tracing subscriber already installed")?;

    Ok(guard)
}

/// Chanflow home directory: `$CHANFLOW_HOME` or `~/.chanflow`.
/// Falls back to `./.chanflow` when no home directory is known.
pub fn chanflow_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("CHANFLOW_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chanflow")
}

pub fn logs_dir() -> PathBuf {
    chanflow_home().join("logs")
}

// Worker ids come from the command line and must not escape the log dir
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    if stem.is_empty() {
        "chanflow".to_string()
    } else {
        stem
    }
}
