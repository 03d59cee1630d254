//! Column type inference over raw text tokens.

use super::value::{SemanticType, parse_bool};

/// Tokens read as missing values unless the caller overrides them.
pub const DEFAULT_NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>",
    "#N/A", "#NA",
];

pub fn default_null_tokens() -> Vec<String> {
    DEFAULT_NULL_TOKENS
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

pub fn is_null_token(value: &str, null_tokens: &[String]) -> bool {
    null_tokens.iter().any(|t| t == value)
}

/// Picks the narrowest type every non-null token fits.
///
/// Candidates are tried in the order Int64, Float64, Bool; anything else is Text.
/// A column with no non-null token is Null.
pub fn infer_type(values: &[&str], null_tokens: &[String]) -> SemanticType {
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;
    let mut seen = false;

    for value in values.iter().filter(|v| !is_null_token(v, null_tokens)) {
        seen = true;
        let trimmed = value.trim();
        if all_int && trimmed.parse::<i64>().is_err() {
            all_int = false;
        }
        if all_float && trimmed.parse::<f64>().is_err() {
            all_float = false;
        }
        if all_bool && parse_bool(trimmed).is_none() {
            all_bool = false;
        }
        if !(all_int || all_float || all_bool) {
            return SemanticType::Text;
        }
    }

    if !seen {
        SemanticType::Null
    } else if all_int {
        SemanticType::Int64
    } else if all_float {
        SemanticType::Float64
    } else if all_bool {
        SemanticType::Bool
    } else {
        SemanticType::Text
    }
}
