//! Caller-owned working state: a loaded table, its current configuration, the
//! configuration history, and the last processed result.

use crate::error::{Result, SiftError};
use crate::export::{ExportFormat, export};
use crate::pipeline::{PipelineConfig, RunReport, run_with_report};
use crate::table::{LoadOptions, Table, load_csv};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub timestamp: DateTime<Utc>,
    pub config: PipelineConfig,
}

/// Append-only record of every configuration applied to a session.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ConfigHistory {
    entries: Vec<ConfigEntry>,
}

impl ConfigHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, config: PipelineConfig) {
        self.entries.push(ConfigEntry {
            timestamp: Utc::now(),
            config,
        });
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    /// The last `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> &[ConfigEntry] {
        let start = self.entries.len().saturating_sub(limit);
        self.entries.get(start..).unwrap_or_default()
    }

    pub fn latest(&self) -> Option<&ConfigEntry> {
        self.entries.last()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Default)]
pub struct Session {
    table: Option<Table>,
    config: PipelineConfig,
    history: ConfigHistory,
    result: Option<Table>,
    last_report: Option<RunReport>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a delimited table, replacing any previous table and result.
    ///
    /// # Errors
    ///
    /// Any [`load_csv`] error; the session is unchanged on failure.
    pub fn load_csv(&mut self, reader: impl Read, options: &LoadOptions) -> Result<String> {
        let table = load_csv(reader, options)?;
        Ok(self.set_table(table))
    }

    /// Replaces the working table and clears the last result.
    pub fn set_table(&mut self, table: Table) -> String {
        let message = format!(
            "Loaded {} rows and {} columns",
            table.row_count(),
            table.column_count()
        );
        self.table = Some(table);
        self.result = None;
        self.last_report = None;
        message
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn history(&self) -> &ConfigHistory {
        &self.history
    }

    pub fn result(&self) -> Option<&Table> {
        self.result.as_ref()
    }

    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    /// Replaces the configuration and records it in the history.
    pub fn update_config(&mut self, config: PipelineConfig) {
        self.history.push(config.clone());
        self.config = config;
        tracing::debug!(history = self.history.len(), "Configuration updated");
    }

    /// Runs the current configuration on the loaded table.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Load`] when no table is loaded, or any pipeline error.
    /// A failed run keeps the previous result.
    pub fn process(&mut self) -> Result<&Table> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| SiftError::Load("No table loaded".to_owned()))?;
        let (result, report) = run_with_report(table, &self.config)?;
        self.last_report = Some(report);
        Ok(self.result.insert(result))
    }

    /// Exports the last processed result.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Other`] when nothing has been processed yet, or any
    /// export error.
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>> {
        let result = self
            .result
            .as_ref()
            .ok_or_else(|| SiftError::Other("No processed result to export".to_owned()))?;
        export(result, format)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn config_json(&self) -> Result<String> {
        self.config.to_json()
    }

    /// Decodes `json` and makes it the current configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] for malformed configuration; the current
    /// configuration and history are unchanged.
    pub fn load_config_json(&mut self, json: &str) -> Result<()> {
        let config = PipelineConfig::from_json(json)?;
        self.update_config(config);
        Ok(())
    }
}
