//! Pipeline configuration data structures and their JSON exchange format.
//!
//! The format uses exactly five top-level keys, in this order:
//!
//! ```json
//! {
//!   "selected_columns": ["region", "amount"],
//!   "filters": [{ "column": "amount", "operator": "ge", "value": "100" }],
//!   "sorting": [{ "column": "amount", "ascending": false }],
//!   "grouping": { "enabled": true, "columns": ["region"] },
//!   "aggregations": [{ "column": "amount", "function": "sum" }]
//! }
//! ```
//!
//! Every key is optional on input. Operator and function values are the short codes
//! listed on [`FilterOperator`] and [`AggregateFunction`].

use crate::error::{Result, ResultExt as _, SiftError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Declarative description of every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Columns to keep, in output order. Empty keeps all columns.
    #[serde(default)]
    pub selected_columns: Vec<String>,

    /// Conjunction of row predicates
    #[serde(default)]
    pub filters: Vec<FilterRule>,

    /// Sort keys, primary first
    #[serde(default)]
    pub sorting: Vec<SortRule>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub grouping: GroupSpec,

    /// Applied per partition when grouping is enabled
    #[serde(default)]
    pub aggregations: Vec<AggregationRule>,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a pipeline config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or fails [`Self::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse and structurally validate a pipeline config
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] on malformed JSON, unknown keys, unknown operator
    /// or function codes, wrongly typed fields, or duplicate column names.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check_structure()?;
        Ok(config)
    }

    /// Save pipeline config to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write pipeline config {}", path.display()))
    }

    /// Serialize to pretty-printed JSON, fields in declaration order
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the constraints serde cannot express.
    fn check_structure(&self) -> Result<()> {
        if let Some(name) = first_duplicate(&self.selected_columns) {
            return Err(SiftError::Config(format!(
                "Column '{name}' listed twice in selected_columns"
            )));
        }
        if let Some(name) = first_duplicate(&self.grouping.columns) {
            return Err(SiftError::Config(format!(
                "Column '{name}' listed twice in grouping.columns"
            )));
        }
        Ok(())
    }
}

/// Encode a config into its exchange bytes.
///
/// # Errors
///
/// Returns [`SiftError::Config`] if serialization fails.
pub fn encode_config(config: &PipelineConfig) -> Result<Vec<u8>> {
    config.to_json().map(String::into_bytes)
}

/// Decode exchange bytes into a config.
///
/// # Errors
///
/// Returns [`SiftError::Config`] for invalid UTF-8 or anything
/// [`PipelineConfig::from_json`] rejects.
pub fn decode_config(bytes: &[u8]) -> Result<PipelineConfig> {
    let json = std::str::from_utf8(bytes)
        .map_err(|e| SiftError::Config(format!("Config is not valid UTF-8: {e}")))?;
    PipelineConfig::from_json(json)
}

/// One row predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRule {
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
}

impl FilterRule {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Filter operator codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    Regex,
    IsNull,
    NotNull,
    In,
}

impl FilterOperator {
    pub const ALL: [Self; 11] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Ge,
        Self::Lt,
        Self::Le,
        Self::Contains,
        Self::Regex,
        Self::IsNull,
        Self::NotNull,
        Self::In,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Contains => "contains",
            Self::Regex => "regex",
            Self::IsNull => "isnull",
            Self::NotNull => "notnull",
            Self::In => "in",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| SiftError::Config(format!("Unknown filter operator '{s}'")))
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortRule {
    pub column: String,
    #[serde(default = "default_true")]
    pub ascending: bool,
}

impl SortRule {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Group-by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl GroupSpec {
    pub fn by<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: true,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// One aggregate output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregationRule {
    pub column: String,
    pub function: AggregateFunction,
}

impl AggregationRule {
    pub fn new(column: impl Into<String>, function: AggregateFunction) -> Self {
        Self {
            column: column.into(),
            function,
        }
    }
}

/// Aggregate function codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Sum,
    Mean,
    Count,
    Max,
    Min,
    Std,
}

impl AggregateFunction {
    pub const ALL: [Self; 6] = [
        Self::Sum,
        Self::Mean,
        Self::Count,
        Self::Max,
        Self::Min,
        Self::Std,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Count => "count",
            Self::Max => "max",
            Self::Min => "min",
            Self::Std => "std",
        }
    }

    /// Whether the function needs numeric (or boolean) input.
    pub fn requires_numeric(self) -> bool {
        matches!(self, Self::Sum | Self::Mean | Self::Std)
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateFunction {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|func| func.as_str() == s)
            .ok_or_else(|| SiftError::Config(format!("Unknown aggregate function '{s}'")))
    }
}

fn default_true() -> bool {
    true
}

// Older configs store `"grouping": null`
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn first_duplicate(names: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .find(|name| !seen.insert(name.as_str()))
        .map(String::as_str)
}
