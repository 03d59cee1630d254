//! Logging setup for the tablesift binary.
//!
//! The library only emits `tracing` events; installing a subscriber is the caller's
//! choice. [`init`] installs the one the CLI uses:
//!
//! - a human-readable layer on stderr, so stdout stays free for exported data
//! - optionally, daily-rotating files in the platform data directory
//!   (`tablesift.<date>.log` with everything, `error.<date>.log` with warnings and errors)
//!
//! The level comes from [`LogSettings::level`] unless `RUST_LOG` is set.
//!
//! ```no_run
//! use tablesift::logging::{self, LogSettings};
//!
//! logging::init(&LogSettings::default())?;
//! tracing::info!("started");
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::config::AppSettings;
use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Logging options, usually taken from [`AppSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Default filter directive, e.g. `info` or `tablesift=debug`
    pub level: String,
    /// Also log to rotating files under [`get_log_dir`]
    pub to_file: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            to_file: false,
        }
    }
}

impl From<&AppSettings> for LogSettings {
    fn from(settings: &AppSettings) -> Self {
        Self {
            level: settings.log_level.clone(),
            to_file: settings.log_to_file,
        }
    }
}

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/tablesift/logs`
/// - macOS: `~/Library/Application Support/tablesift/logs`
/// - Linux: `~/.local/share/tablesift/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;

    let log_dir = base_dir.join("tablesift").join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

fn file_appender(log_dir: &std::path::Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create {prefix} file appender"))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns error if the filter is invalid, the log directory or file appenders
/// cannot be created, or a global subscriber is already installed.
pub fn init(settings: &LogSettings) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .with_context(|| format!("Invalid log level '{}'", settings.level))?;

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (log_dir, all_logs_layer, error_logs_layer) = if settings.to_file {
        let log_dir = get_log_dir()?;
        let all_logs = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(file_appender(&log_dir, "tablesift")?);
        let errors = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(file_appender(&log_dir, "error")?)
            .with_filter(EnvFilter::new("warn"));
        (Some(log_dir), Some(all_logs), Some(errors))
    } else {
        (None, None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(dir) = log_dir {
        tracing::debug!("Logging initialized, log directory: {}", dir.display());
    }
    Ok(())
}
