//! Pipeline configuration validation.
//!
//! Validates a config against a table schema before execution, simulating the column
//! set stage by stage so a run never starts a stage it cannot finish.

use super::Stage;
use super::predicate::compile_anchored;
use super::spec::{AggregateFunction, FilterOperator, PipelineConfig};
use crate::error::SiftError;
use crate::table::SemanticType;
use std::collections::HashSet;

/// What is wrong with one part of a config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    MissingColumn,
    DuplicateColumn,
    InvalidRegex(String),
    NoGroupColumns,
    UnsupportedAggregate {
        function: AggregateFunction,
        kind: SemanticType,
    },
}

/// Validation error with helpful context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub stage: Stage,
    /// Index into the stage's rule list, when the problem belongs to one rule
    pub rule_index: Option<usize>,
    pub column: Option<String>,
    pub problem: Problem,
}

impl ValidationError {
    fn new(
        stage: Stage,
        rule_index: Option<usize>,
        column: Option<&String>,
        problem: Problem,
    ) -> Self {
        Self {
            stage,
            rule_index,
            column: column.cloned(),
            problem,
        }
    }

    fn message(&self) -> String {
        let column = self.column.as_deref().unwrap_or_default();
        match &self.problem {
            Problem::MissingColumn => format!("column '{column}' not found"),
            Problem::DuplicateColumn => format!("column '{column}' listed more than once"),
            Problem::InvalidRegex(err) => {
                format!("invalid regular expression for column '{column}': {err}")
            }
            Problem::NoGroupColumns => "grouping is enabled but no columns are listed".to_owned(),
            Problem::UnsupportedAggregate { function, kind } => {
                format!("'{function}' cannot aggregate {kind} column '{column}'")
            }
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(idx) = self.rule_index {
            write!(f, "{} rule {}: {}", self.stage, idx + 1, self.message())
        } else {
            write!(f, "{}: {}", self.stage, self.message())
        }
    }
}

impl From<ValidationError> for SiftError {
    fn from(err: ValidationError) -> Self {
        let message = err.message();
        match (err.problem, err.column) {
            (Problem::MissingColumn, Some(column)) => Self::missing_column(err.stage, column),
            (Problem::UnsupportedAggregate { .. }, Some(column)) => {
                Self::execution(err.stage, column, message)
            }
            _ => Self::Config(format!("{} stage: {message}", err.stage)),
        }
    }
}

/// Validate a pipeline config against an input schema
pub fn validate_pipeline(
    config: &PipelineConfig,
    schema: &[(String, SemanticType)],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let current = validate_projection(config, schema, &mut errors);
    validate_filters(config, &current, &mut errors);
    validate_sorting(config, &current, &mut errors);
    if config.grouping.enabled {
        validate_grouping(config, &current, &mut errors);
    }

    errors
}

fn lookup(schema: &[(String, SemanticType)], name: &str) -> Option<SemanticType> {
    schema.iter().find(|(n, _)| n == name).map(|(_, kind)| *kind)
}

/// Returns the schema the later stages see.
fn validate_projection(
    config: &PipelineConfig,
    schema: &[(String, SemanticType)],
    errors: &mut Vec<ValidationError>,
) -> Vec<(String, SemanticType)> {
    if config.selected_columns.is_empty() {
        return schema.to_vec();
    }

    let mut seen = HashSet::new();
    let mut projected = Vec::new();
    for name in &config.selected_columns {
        if !seen.insert(name.as_str()) {
            errors.push(ValidationError::new(
                Stage::Projection,
                None,
                Some(name),
                Problem::DuplicateColumn,
            ));
            continue;
        }
        match lookup(schema, name) {
            Some(kind) => projected.push((name.clone(), kind)),
            None => errors.push(ValidationError::new(
                Stage::Projection,
                None,
                Some(name),
                Problem::MissingColumn,
            )),
        }
    }
    projected
}

fn validate_filters(
    config: &PipelineConfig,
    current: &[(String, SemanticType)],
    errors: &mut Vec<ValidationError>,
) {
    for (idx, rule) in config.filters.iter().enumerate() {
        if lookup(current, &rule.column).is_none() {
            errors.push(ValidationError::new(
                Stage::Filter,
                Some(idx),
                Some(&rule.column),
                Problem::MissingColumn,
            ));
            continue;
        }

        if rule.operator == FilterOperator::Regex
            && let Err(e) = compile_anchored(&rule.value)
        {
            errors.push(ValidationError::new(
                Stage::Filter,
                Some(idx),
                Some(&rule.column),
                Problem::InvalidRegex(e.to_string()),
            ));
        }
    }
}

fn validate_sorting(
    config: &PipelineConfig,
    current: &[(String, SemanticType)],
    errors: &mut Vec<ValidationError>,
) {
    for (idx, rule) in config.sorting.iter().enumerate() {
        if lookup(current, &rule.column).is_none() {
            errors.push(ValidationError::new(
                Stage::Sort,
                Some(idx),
                Some(&rule.column),
                Problem::MissingColumn,
            ));
        }
    }
}

fn validate_grouping(
    config: &PipelineConfig,
    current: &[(String, SemanticType)],
    errors: &mut Vec<ValidationError>,
) {
    if config.grouping.columns.is_empty() {
        errors.push(ValidationError::new(
            Stage::Aggregate,
            None,
            None,
            Problem::NoGroupColumns,
        ));
    }

    let mut seen = HashSet::new();
    for name in &config.grouping.columns {
        if !seen.insert(name.as_str()) {
            errors.push(ValidationError::new(
                Stage::Aggregate,
                None,
                Some(name),
                Problem::DuplicateColumn,
            ));
        } else if lookup(current, name).is_none() {
            errors.push(ValidationError::new(
                Stage::Aggregate,
                None,
                Some(name),
                Problem::MissingColumn,
            ));
        }
    }

    for (idx, rule) in config.aggregations.iter().enumerate() {
        match lookup(current, &rule.column) {
            None => errors.push(ValidationError::new(
                Stage::Aggregate,
                Some(idx),
                Some(&rule.column),
                Problem::MissingColumn,
            )),
            Some(SemanticType::Text) if rule.function.requires_numeric() => {
                errors.push(ValidationError::new(
                    Stage::Aggregate,
                    Some(idx),
                    Some(&rule.column),
                    Problem::UnsupportedAggregate {
                        function: rule.function,
                        kind: SemanticType::Text,
                    },
                ));
            }
            Some(_) => {}
        }
    }
}
