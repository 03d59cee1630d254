//! Cell values, semantic types and lenient coercion.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Inferred value kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Null,
    Int64,
    Float64,
    Text,
    Bool,
}

impl SemanticType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Text => "text",
            Self::Bool => "bool",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Int64(i64),
    Float64(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn semantic_type(&self) -> SemanticType {
        match self {
            Self::Null => SemanticType::Null,
            Self::Int64(_) => SemanticType::Int64,
            Self::Float64(_) => SemanticType::Float64,
            Self::Text(_) => SemanticType::Text,
            Self::Bool(_) => SemanticType::Bool,
        }
    }

    /// Numeric view of the cell. Only `Int64` and `Float64` have one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Compares two cells of a compatible type pair.
    ///
    /// Returns `None` for incompatible pairs (including anything involving `Null`);
    /// callers decide how to degrade.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int64(a), Self::Int64(b)) => Some(a.cmp(b)),
            (Self::Int64(_) | Self::Float64(_), Self::Int64(_) | Self::Float64(_)) => {
                let (a, b) = (self.as_f64()?, other.as_f64()?);
                a.partial_cmp(&b)
            }
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used by the sort stage: values of one column, `Null` last.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Greater,
            (_, Self::Null) => Ordering::Less,
            (Self::Float64(a), Self::Float64(b)) => a.total_cmp(b),
            _ => self
                .compare(other)
                .unwrap_or_else(|| self.to_string().cmp(&other.to_string())),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => f.write_str(&format_float(*v)),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Integral floats keep one decimal place so `2.0` never reads back as an integer.
/// From `1e16` up they switch to exponent form (`1e16`) for the same reason.
pub fn format_float(v: f64) -> String {
    if !v.is_finite() || v.fract() != 0.0 {
        format!("{v}")
    } else if v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v:e}")
    }
}

/// Outcome of [`coerce`]: the typed value, or the original text when conversion failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    Typed(CellValue),
    Fallback(String),
}

impl Coercion {
    pub fn is_typed(&self) -> bool {
        matches!(self, Self::Typed(_))
    }

    /// Collapses the outcome into a cell; a fallback becomes `Text`.
    pub fn into_value(self) -> CellValue {
        match self {
            Self::Typed(v) => v,
            Self::Fallback(s) => CellValue::Text(s),
        }
    }
}

/// Converts raw text to `target`, never failing.
pub fn coerce(value: &str, target: SemanticType) -> Coercion {
    let typed = match target {
        SemanticType::Null => value.is_empty().then_some(CellValue::Null),
        SemanticType::Int64 => value.trim().parse::<i64>().ok().map(CellValue::Int64),
        SemanticType::Float64 => value.trim().parse::<f64>().ok().map(CellValue::Float64),
        SemanticType::Bool => parse_bool(value).map(CellValue::Bool),
        SemanticType::Text => Some(CellValue::Text(value.to_owned())),
    };
    match typed {
        Some(v) => Coercion::Typed(v),
        None => Coercion::Fallback(value.to_owned()),
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(
            coerce(" 42 ", SemanticType::Int64),
            Coercion::Typed(CellValue::Int64(42))
        );
        assert_eq!(
            coerce("2.5", SemanticType::Float64),
            Coercion::Typed(CellValue::Float64(2.5))
        );
    }

    #[test]
    fn test_coerce_falls_back_to_text() {
        let outcome = coerce("abc", SemanticType::Int64);
        assert!(!outcome.is_typed());
        assert_eq!(outcome.into_value(), CellValue::Text("abc".to_owned()));
    }

    #[test]
    fn test_coerce_bool_any_case() {
        assert_eq!(
            coerce("TRUE", SemanticType::Bool),
            Coercion::Typed(CellValue::Bool(true))
        );
        assert!(!coerce("yes", SemanticType::Bool).is_typed());
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Float64(2.0).to_string(), "2.0");
        assert_eq!(CellValue::Float64(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Int64(-7).to_string(), "-7");
        assert_eq!(CellValue::Bool(false).to_string(), "false");
        assert_eq!(CellValue::Null.to_string(), "");
    }

    #[test]
    fn test_large_integral_float_stays_float() {
        assert_eq!(format_float(1e16), "1e16");
        assert_eq!(format_float(-2.5e20), "-2.5e20");
        assert_eq!(format_float(9_999_999_999_999_998.0), "9999999999999998.0");
        let rendered = CellValue::Float64(1e16).to_string();
        assert_eq!(
            crate::table::infer_type(&[rendered.as_str()], &[]),
            SemanticType::Float64
        );
    }

    #[test]
    fn test_compare_mixed_numeric() {
        assert_eq!(
            CellValue::Int64(2).compare(&CellValue::Float64(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(CellValue::Int64(2).compare(&CellValue::from("2")), None);
    }

    #[test]
    fn test_sort_cmp_nulls_last() {
        assert_eq!(
            CellValue::Null.sort_cmp(&CellValue::Int64(1)),
            Ordering::Greater
        );
        assert_eq!(
            CellValue::Int64(1).sort_cmp(&CellValue::Null),
            Ordering::Less
        );
    }
}
