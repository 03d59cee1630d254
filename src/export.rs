//! Serialization of result tables to CSV and JSON records.

use crate::error::{Result, ResultExt as _, SiftError};
use crate::table::{CellValue, Table};
use serde::ser::{SerializeMap as _, SerializeSeq as _};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Output format for an exported table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated rows under a header line
    #[default]
    Csv,
    /// Pretty-printed array of row objects
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Picks a format from a file name's extension, case-insensitively.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(SiftError::Config(format!(
                "Unknown export format '{other}' (expected csv or json)"
            ))),
        }
    }
}

/// Serializes `table` in `format`.
///
/// # Errors
///
/// See [`to_row_format`] and [`to_record_format`].
pub fn export(table: &Table, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_row_format(table),
        ExportFormat::Json => to_record_format(table),
    }
}

/// Serializes `table` and writes it to `path`.
///
/// # Errors
///
/// Returns an error when serialization fails or the file cannot be written.
pub fn export_to_path(table: &Table, format: ExportFormat, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = export(table, format)?;
    std::fs::write(path, &bytes)
        .with_context(|| format!("Failed to write export file {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        format = %format,
        rows = table.row_count(),
        "Exported table"
    );
    Ok(())
}

/// CSV with a header row. Nulls are empty fields; a zero-row table is just the header.
///
/// # Errors
///
/// Returns [`SiftError::Other`] if the CSV writer fails.
pub fn to_row_format(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.column_names())
        .map_err(|e| SiftError::Other(format!("Failed to write CSV header: {e}")))?;

    let mut fields = Vec::with_capacity(table.column_count());
    for row in 0..table.row_count() {
        fields.clear();
        fields.extend(
            table
                .columns()
                .iter()
                .map(|c| c.get(row).map(ToString::to_string).unwrap_or_default()),
        );
        writer
            .write_record(&fields)
            .map_err(|e| SiftError::Other(format!("Failed to write CSV row {row}: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| SiftError::Io(e.into_error()))
}

/// A pretty-printed JSON array of row objects, keys in column order.
///
/// # Errors
///
/// Returns [`SiftError::Config`] if JSON serialization fails.
pub fn to_record_format(table: &Table) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&Records(table))?)
}

struct Records<'a>(&'a Table);

struct Record<'a> {
    table: &'a Table,
    row: usize,
}

struct Cell<'a>(&'a CellValue);

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.row_count()))?;
        for row in 0..self.0.row_count() {
            seq.serialize_element(&Record { table: self.0, row })?;
        }
        seq.end()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.column_count()))?;
        for column in self.table.columns() {
            let value = column.get(self.row).unwrap_or(&CellValue::Null);
            map.serialize_entry(column.name(), &Cell(value))?;
        }
        map.end()
    }
}

impl Serialize for Cell<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Int64(v) => serializer.serialize_i64(*v),
            CellValue::Float64(v) if v.is_finite() => serializer.serialize_f64(*v),
            CellValue::Float64(_) => serializer.serialize_none(),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}
