//! Application settings persisted as JSON.
//!
//! Settings live in `<config dir>/tablesift/settings.json` unless a path is given. A
//! missing file means defaults; a file that exists but does not parse is an error, so
//! a typo never silently resets someone's settings.

use crate::error::{Result, ResultExt as _, SiftError};
use crate::export::ExportFormat;
use crate::table::{LoadOptions, default_null_tokens};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Also write daily log files under the data directory
    pub log_to_file: bool,
    /// Single-character field delimiter for loaded tables
    pub delimiter: String,
    /// Raw tokens read as missing values
    pub null_tokens: Vec<String>,
    /// Format used when neither a flag nor the output extension decides
    pub default_export_format: ExportFormat,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_to_file: false,
            delimiter: ",".to_owned(),
            null_tokens: default_null_tokens(),
            default_export_format: ExportFormat::Csv,
        }
    }
}

impl AppSettings {
    /// Table loading options derived from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] when `delimiter` is not a single ASCII character.
    pub fn load_options(&self) -> Result<LoadOptions> {
        let delimiter = match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => *b,
            _ => {
                return Err(SiftError::Config(format!(
                    "Delimiter must be a single ASCII character, got '{}'",
                    self.delimiter
                )));
            }
        };
        Ok(LoadOptions {
            delimiter,
            null_tokens: self.null_tokens.clone(),
        })
    }
}

/// Default settings file location, if the platform has a config directory.
pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tablesift").join("settings.json"))
}

/// Loads settings from `path`, or from [`settings_path`] when `None`.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_settings(path: Option<&Path>) -> Result<AppSettings> {
    let Some(path) = path.map(Path::to_path_buf).or_else(settings_path) else {
        return Ok(AppSettings::default());
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No settings file, using defaults");
        return Ok(AppSettings::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read settings {}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| {
        SiftError::Config(format!("Invalid settings file {}: {e}", path.display()))
    })
}

/// Writes `settings` as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns an error when the directory or file cannot be written.
pub fn save_settings(settings: &AppSettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
