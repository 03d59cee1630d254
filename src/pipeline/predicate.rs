//! Row predicate evaluation.
//!
//! A [`FilterRule`] is compiled once per run against its column's semantic type:
//! the comparison operand is coerced, the regular expression is built, and the `in`
//! set is split. Evaluating the compiled [`Predicate`] per cell is then allocation
//! free for every operator except the ones that need a cell's string form.

use super::spec::{FilterOperator, FilterRule};
use crate::error::{Result, SiftError};
use crate::pipeline::Stage;
use crate::table::{CellValue, Coercion, SemanticType, Table, coerce};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;

/// A filter rule ready to be applied to cells of one column.
#[derive(Debug, Clone)]
pub struct Predicate {
    column: String,
    test: Test,
}

#[derive(Debug, Clone)]
enum Test {
    Compare {
        operator: FilterOperator,
        operand: CellValue,
    },
    Contains(String),
    Matches(Regex),
    IsNull,
    NotNull,
    In(HashSet<String>),
}

impl Predicate {
    /// Compiles `rule` for a column of type `column_type`.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] when a `regex` rule's pattern does not compile.
    pub fn compile(rule: &FilterRule, column_type: SemanticType) -> Result<Self> {
        let test = match rule.operator {
            FilterOperator::Eq
            | FilterOperator::Ne
            | FilterOperator::Gt
            | FilterOperator::Ge
            | FilterOperator::Lt
            | FilterOperator::Le => Test::Compare {
                operator: rule.operator,
                operand: comparison_operand(&rule.value, column_type),
            },
            FilterOperator::Contains => Test::Contains(rule.value.clone()),
            FilterOperator::Regex => Test::Matches(compile_anchored(&rule.value).map_err(|e| {
                SiftError::Config(format!(
                    "Invalid regular expression '{}' for column '{}': {e}",
                    rule.value, rule.column
                ))
            })?),
            FilterOperator::IsNull => Test::IsNull,
            FilterOperator::NotNull => Test::NotNull,
            FilterOperator::In => Test::In(
                rule.value
                    .split(',')
                    .map(|segment| segment.trim().to_owned())
                    .collect(),
            ),
        };
        Ok(Self {
            column: rule.column.clone(),
            test,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Whether `cell` satisfies the rule.
    pub fn matches(&self, cell: &CellValue) -> bool {
        match &self.test {
            Test::IsNull => cell.is_null(),
            Test::NotNull => !cell.is_null(),
            Test::Compare { operator, operand } => compare(*operator, cell, operand),
            _ if cell.is_null() => false,
            Test::Contains(needle) => cell.to_string().contains(needle.as_str()),
            Test::Matches(re) => re.is_match(&cell.to_string()),
            Test::In(set) => set.contains(&cell.to_string()),
        }
    }
}

/// Evaluates `rule` against one row of `table`.
///
/// Convenience for single checks; the executor compiles each rule once instead.
///
/// # Errors
///
/// Returns an execution error when the column is missing or `row` is out of range,
/// and a configuration error for an invalid regular expression.
pub fn evaluate(rule: &FilterRule, table: &Table, row: usize) -> Result<bool> {
    let column = table
        .column(&rule.column)
        .ok_or_else(|| SiftError::missing_column(Stage::Filter, &rule.column))?;
    let cell = column.get(row).ok_or_else(|| {
        SiftError::execution(
            Stage::Filter,
            &rule.column,
            format!("row {row} out of range"),
        )
    })?;
    Ok(Predicate::compile(rule, column.kind())?.matches(cell))
}

/// Numeric columns get a number when the text parses, the raw text otherwise.
fn comparison_operand(value: &str, column_type: SemanticType) -> CellValue {
    match column_type {
        SemanticType::Int64 | SemanticType::Float64 => match coerce(value, SemanticType::Int64) {
            Coercion::Typed(v) => v,
            Coercion::Fallback(_) => coerce(value, SemanticType::Float64).into_value(),
        },
        _ => CellValue::Text(value.to_owned()),
    }
}

fn compare(operator: FilterOperator, cell: &CellValue, operand: &CellValue) -> bool {
    if cell.is_null() {
        return operator == FilterOperator::Ne;
    }

    let ordering = match (cell, operand) {
        (CellValue::Text(_), _) | (_, CellValue::Text(_)) => {
            cell.compare(operand)
                .or_else(|| Some(cell.to_string().cmp(&operand.to_string())))
        }
        _ => cell.compare(operand),
    };

    // Only NaN reaches here without an ordering
    let Some(ordering) = ordering else {
        return operator == FilterOperator::Ne;
    };

    match operator {
        FilterOperator::Eq => ordering == Ordering::Equal,
        FilterOperator::Ne => ordering != Ordering::Equal,
        FilterOperator::Gt => ordering == Ordering::Greater,
        FilterOperator::Ge => ordering != Ordering::Less,
        FilterOperator::Lt => ordering == Ordering::Less,
        FilterOperator::Le => ordering != Ordering::Greater,
        _ => false,
    }
}

/// Match-from-start semantics.
///
/// The pattern must compile on its own first; an unbalanced `)` could otherwise
/// close the anchoring group and leave later alternatives unanchored.
pub(crate) fn compile_anchored(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(pattern)?;
    Regex::new(&format!("^(?:{pattern})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(op: FilterOperator, value: &str, kind: SemanticType, cell: CellValue) -> bool {
        Predicate::compile(&FilterRule::new("c", op, value), kind)
            .unwrap()
            .matches(&cell)
    }

    #[test]
    fn test_numeric_comparison_parses_operand() {
        assert!(check(FilterOperator::Ge, "2", SemanticType::Int64, CellValue::Int64(2)));
        assert!(!check(FilterOperator::Gt, "2", SemanticType::Int64, CellValue::Int64(2)));
        assert!(check(FilterOperator::Lt, "2.5", SemanticType::Int64, CellValue::Int64(2)));
        assert!(check(FilterOperator::Eq, "10", SemanticType::Float64, CellValue::Float64(10.0)));
    }

    #[test]
    fn test_numeric_unparsable_operand_compares_as_text() {
        // "10" < "9x" as text
        assert!(check(FilterOperator::Lt, "9x", SemanticType::Int64, CellValue::Int64(10)));
        assert!(!check(FilterOperator::Eq, "abc", SemanticType::Int64, CellValue::Int64(1)));
        assert!(check(FilterOperator::Ne, "abc", SemanticType::Int64, CellValue::Int64(1)));
    }

    #[test]
    fn test_text_comparison_is_lexicographic() {
        assert!(check(FilterOperator::Gt, "10", SemanticType::Text, CellValue::from("9")));
        assert!(check(FilterOperator::Eq, "x", SemanticType::Text, CellValue::from("x")));
    }

    #[test]
    fn test_bool_column_compares_as_text() {
        assert!(check(FilterOperator::Eq, "true", SemanticType::Bool, CellValue::Bool(true)));
        assert!(!check(FilterOperator::Eq, "True", SemanticType::Bool, CellValue::Bool(true)));
    }

    #[test]
    fn test_null_cells() {
        assert!(!check(FilterOperator::Eq, "1", SemanticType::Int64, CellValue::Null));
        assert!(check(FilterOperator::Ne, "1", SemanticType::Int64, CellValue::Null));
        assert!(!check(FilterOperator::Contains, "", SemanticType::Text, CellValue::Null));
        assert!(!check(FilterOperator::Regex, ".*", SemanticType::Text, CellValue::Null));
        assert!(!check(FilterOperator::In, "", SemanticType::Text, CellValue::Null));
        assert!(check(FilterOperator::IsNull, "", SemanticType::Text, CellValue::Null));
        assert!(!check(FilterOperator::NotNull, "", SemanticType::Text, CellValue::Null));
    }

    #[test]
    fn test_contains_uses_string_form() {
        assert!(check(FilterOperator::Contains, "an", SemanticType::Text, CellValue::from("banana")));
        assert!(check(FilterOperator::Contains, "23", SemanticType::Int64, CellValue::Int64(1234)));
        assert!(check(FilterOperator::Contains, ".5", SemanticType::Float64, CellValue::Float64(2.5)));
    }

    #[test]
    fn test_regex_is_anchored_at_start() {
        assert!(check(FilterOperator::Regex, "a", SemanticType::Text, CellValue::from("apple")));
        assert!(!check(FilterOperator::Regex, "p", SemanticType::Text, CellValue::from("apple")));
        assert!(check(FilterOperator::Regex, "^a", SemanticType::Text, CellValue::from("avocado")));
        assert!(check(FilterOperator::Regex, "a|b", SemanticType::Text, CellValue::from("banana")));
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let rule = FilterRule::new("c", FilterOperator::Regex, "([a-z");
        let result = Predicate::compile(&rule, SemanticType::Text);
        assert!(matches!(result, Err(SiftError::Config(_))));
    }

    #[test]
    fn test_unbalanced_group_cannot_escape_anchor() {
        let rule = FilterRule::new("c", FilterOperator::Regex, "x)|(?:y");
        let result = Predicate::compile(&rule, SemanticType::Text);
        assert!(matches!(result, Err(SiftError::Config(_))));
        assert!(compile_anchored("x)|(?:y").is_err());
    }

    #[test]
    fn test_in_set_trims_segments() {
        let kind = SemanticType::Text;
        assert!(check(FilterOperator::In, "red, green ,blue", kind, CellValue::from("green")));
        assert!(!check(FilterOperator::In, "red, green", kind, CellValue::from("gree")));
        assert!(check(FilterOperator::In, "1, 2", SemanticType::Int64, CellValue::Int64(2)));
    }

    #[test]
    fn test_evaluate_against_table_row() {
        let table = crate::table::load_csv(
            "n\n1\n2\n".as_bytes(),
            &crate::table::LoadOptions::default(),
        )
        .unwrap();
        let rule = FilterRule::new("n", FilterOperator::Gt, "1");
        assert!(!evaluate(&rule, &table, 0).unwrap());
        assert!(evaluate(&rule, &table, 1).unwrap());

        let missing = FilterRule::new("m", FilterOperator::Gt, "1");
        assert!(matches!(
            evaluate(&missing, &table, 0),
            Err(SiftError::Execution { .. })
        ));
    }
}
