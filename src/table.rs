//! In-memory table model.
//!
//! A [`Table`] is an ordered list of uniquely named [`Column`]s of equal length.
//! Tables are immutable once built: every pipeline stage reads a `&Table` and returns
//! a new one, so a loaded table can be shared across threads and reused for any
//! number of runs.
//!
//! ```
//! use tablesift::table::{CellValue, LoadOptions, SemanticType, Table};
//!
//! let table = Table::from_raw(
//!     vec!["name".to_owned(), "age".to_owned()],
//!     vec![
//!         vec!["alice".to_owned(), "31".to_owned()],
//!         vec!["bob".to_owned(), "".to_owned()],
//!     ],
//!     &LoadOptions::default(),
//! )?;
//!
//! assert_eq!(table.column("age").map(|c| c.kind()), Some(SemanticType::Int64));
//! assert_eq!(table.cell(1, "age"), Some(&CellValue::Null));
//! # Ok::<(), tablesift::error::SiftError>(())
//! ```

pub mod inference;
pub mod loader;
pub mod value;

pub use inference::{DEFAULT_NULL_TOKENS, default_null_tokens, infer_type};
pub use loader::{LoadOptions, load_csv, load_csv_path};
pub use value::{CellValue, Coercion, SemanticType, coerce};

use crate::error::{Result, SiftError};
use std::collections::HashSet;

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: SemanticType,
    values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: SemanticType, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    /// Infers the column type from raw tokens and coerces every cell to it.
    pub fn from_raw(name: impl Into<String>, raw: &[&str], null_tokens: &[String]) -> Self {
        let kind = infer_type(raw, null_tokens);
        let values = raw
            .iter()
            .map(|token| {
                if inference::is_null_token(token, null_tokens) {
                    CellValue::Null
                } else {
                    coerce(token, kind).into_value()
                }
            })
            .collect();
        Self::new(name, kind, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SemanticType {
        self.kind
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&CellValue> {
        self.values.get(row)
    }

    /// New column holding the rows at `indices`, in that order.
    pub(crate) fn take(&self, indices: &[usize]) -> Self {
        let values = indices
            .iter()
            .filter_map(|&i| self.values.get(i).cloned())
            .collect();
        Self::new(self.name.clone(), self.kind, values)
    }
}

/// Ordered, uniquely named columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Builds a table, checking that names are unique and lengths agree.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Load`] when two columns share a name or have different
    /// lengths.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(SiftError::Load(format!(
                    "Duplicate column name '{}'",
                    column.name()
                )));
            }
            if column.len() != row_count {
                return Err(SiftError::Load(format!(
                    "Column '{}' has {} values, expected {row_count}",
                    column.name(),
                    column.len()
                )));
            }
        }
        Ok(Self { columns, row_count })
    }

    /// Builds a table from raw text rows, inferring each column's type.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Load`] when a row's width differs from the header's or a
    /// header name repeats.
    pub fn from_raw(
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        options: &LoadOptions,
    ) -> Result<Self> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(SiftError::Load(format!(
                    "Row {} has {} fields, expected {}",
                    idx + 1,
                    row.len(),
                    headers.len()
                )));
            }
        }

        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let raw: Vec<&str> = rows
                    .iter()
                    .filter_map(|row| row.get(col_idx).map(String::as_str))
                    .collect();
                Column::from_raw(name, &raw, &options.null_tokens)
            })
            .collect();

        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Column names paired with their inferred types, in column order.
    pub fn schema(&self) -> Vec<(String, SemanticType)> {
        self.columns
            .iter()
            .map(|c| (c.name().to_owned(), c.kind()))
            .collect()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.column(column)?.get(row)
    }

    /// One row's cells in column order.
    pub fn row(&self, row: usize) -> Option<Vec<&CellValue>> {
        if row >= self.row_count {
            return None;
        }
        self.columns.iter().map(|c| c.get(row)).collect()
    }

    /// New table holding the rows at `indices`, in that order.
    pub(crate) fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            row_count: indices.len(),
        }
    }
}
