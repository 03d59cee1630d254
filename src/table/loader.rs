//! Delimited-text loading.

use super::Table;
use super::inference::default_null_tokens;
use crate::error::{Result, ResultExt as _, SiftError};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Options for reading a delimited source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Field delimiter byte
    pub delimiter: u8,

    /// Raw tokens read as missing values
    pub null_tokens: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_tokens: default_null_tokens(),
        }
    }
}

/// Reads a delimited table with a mandatory header row.
///
/// # Errors
///
/// Returns [`SiftError::Load`] when the input has no header row, a record's width
/// differs from the header's, or the input is not valid UTF-8.
pub fn load_csv(reader: impl Read, options: &LoadOptions) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(options.delimiter)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_owned).collect();
    if headers.is_empty() {
        return Err(SiftError::Load("Missing header row".to_owned()));
    }
    let headers = dedupe_headers(headers);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_owned).collect());
    }

    let table = Table::from_raw(headers, rows, options)?;
    tracing::info!(
        rows = table.row_count(),
        columns = table.column_count(),
        "Loaded table"
    );
    Ok(table)
}

/// Opens `path` and reads it with [`load_csv`].
///
/// # Errors
///
/// Returns an error when the file cannot be opened, or any [`load_csv`] error.
pub fn load_csv_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Table> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open table {}", path.display()))?;
    load_csv(std::io::BufReader::new(file), options)
}

/// Repeated names get `.1`, `.2`, ... appended, first occurrence unchanged.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(headers.len());

    for name in headers {
        let mut candidate = name.clone();
        let mut count = 0;
        while seen.contains(&candidate) {
            count += 1;
            candidate = format!("{name}.{count}");
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }
    result
}
