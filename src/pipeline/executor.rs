//! Pipeline execution engine.
//!
//! Executes a [`PipelineConfig`] against a [`Table`], applying projection, filtering,
//! sorting, and grouping in that fixed order and producing a new table. The source
//! table is only ever borrowed.

use super::aggregate::group_and_aggregate;
use super::predicate::Predicate;
use super::spec::{FilterRule, PipelineConfig, SortRule};
use super::validation::validate_pipeline;
use crate::error::{Result, SiftError};
use crate::table::{Column, Table};
use std::cmp::Ordering;
use std::fmt;

/// A pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Projection,
    Filter,
    Sort,
    Aggregate,
}

impl Stage {
    pub const ALL: [Self; 4] = [Self::Projection, Self::Filter, Self::Sort, Self::Aggregate];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Projection => "projection",
            Self::Filter => "filter",
            Self::Sort => "sort",
            Self::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report generated after pipeline execution
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of rows before processing
    pub rows_before: usize,

    /// Number of columns before processing
    pub columns_before: usize,

    /// Number of rows after processing
    pub rows_after: usize,

    /// Number of columns after processing
    pub columns_after: usize,

    /// Stages that changed or could have changed the table
    pub stages_applied: Vec<Stage>,

    /// Warnings generated during execution
    pub warnings: Vec<String>,

    /// Time taken for execution
    pub duration: std::time::Duration,
}

impl RunReport {
    /// Create a summary message
    pub fn summary(&self) -> String {
        let stages = if self.stages_applied.is_empty() {
            "none".to_owned()
        } else {
            self.stages_applied
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "Processing complete. Result has {} rows and {} columns ({} → {} rows, {} → {} columns; stages: {stages}; {:.2}s)",
            self.rows_after,
            self.columns_after,
            self.rows_before,
            self.rows_after,
            self.columns_before,
            self.columns_after,
            self.duration.as_secs_f64()
        )
    }
}

/// Runs `config` against `table` and returns the transformed table.
///
/// # Errors
///
/// Fails before any stage runs when the config does not fit the table's schema
/// (see [`validate_pipeline`]), and with [`SiftError::Execution`] for failures
/// found while computing, such as an integer sum that overflows.
pub fn run(table: &Table, config: &PipelineConfig) -> Result<Table> {
    run_with_report(table, config).map(|(result, _)| result)
}

/// Like [`run`], also returning a [`RunReport`].
///
/// # Errors
///
/// Same as [`run`].
pub fn run_with_report(table: &Table, config: &PipelineConfig) -> Result<(Table, RunReport)> {
    let start = std::time::Instant::now();
    let mut warnings = Vec::new();
    let mut stages_applied = Vec::new();

    let validation_errors = validate_pipeline(config, &table.schema());
    if let Some(first) = validation_errors.first() {
        tracing::warn!(
            problems = validation_errors.len(),
            "Pipeline validation failed: {first}"
        );
        return Err(first.clone().into());
    }

    let mut current = if config.selected_columns.is_empty() {
        table.clone()
    } else {
        stages_applied.push(Stage::Projection);
        project(table, &config.selected_columns)?
    };
    tracing::debug!(columns = current.column_count(), "Projection done");

    if !config.filters.is_empty() {
        current = filter(&current, &config.filters)?;
        stages_applied.push(Stage::Filter);
        tracing::debug!(rows = current.row_count(), "Filter done");
    }

    if !config.sorting.is_empty() {
        current = sort(&current, &config.sorting)?;
        stages_applied.push(Stage::Sort);
        tracing::debug!(keys = config.sorting.len(), "Sort done");
    }

    if config.grouping.enabled {
        current = group_and_aggregate(&current, &config.grouping, &config.aggregations)?;
        stages_applied.push(Stage::Aggregate);
        tracing::debug!(rows = current.row_count(), "Aggregation done");
    } else if !config.aggregations.is_empty() {
        let message = format!(
            "{} aggregation rule(s) ignored because grouping is disabled",
            config.aggregations.len()
        );
        tracing::warn!("{message}");
        warnings.push(message);
    }

    let report = RunReport {
        rows_before: table.row_count(),
        columns_before: table.column_count(),
        rows_after: current.row_count(),
        columns_after: current.column_count(),
        stages_applied,
        warnings,
        duration: start.elapsed(),
    };
    tracing::info!("{}", report.summary());
    Ok((current, report))
}

/// Keeps exactly `names`, in that order.
fn project(table: &Table, names: &[String]) -> Result<Table> {
    let columns = names
        .iter()
        .map(|name| {
            table
                .column(name)
                .cloned()
                .ok_or_else(|| SiftError::missing_column(Stage::Projection, name))
        })
        .collect::<Result<Vec<Column>>>()?;
    Table::new(columns)
}

/// Keeps the rows that satisfy every rule.
fn filter(table: &Table, rules: &[FilterRule]) -> Result<Table> {
    let compiled = rules
        .iter()
        .map(|rule| -> Result<_> {
            let column = table
                .column(&rule.column)
                .ok_or_else(|| SiftError::missing_column(Stage::Filter, &rule.column))?;
            Ok((Predicate::compile(rule, column.kind())?, column))
        })
        .collect::<Result<Vec<_>>>()?;

    let keep: Vec<usize> = (0..table.row_count())
        .filter(|&row| {
            compiled
                .iter()
                .all(|(predicate, column)| column.get(row).is_some_and(|c| predicate.matches(c)))
        })
        .collect();

    Ok(table.take_rows(&keep))
}

/// Stable multi-key sort. Nulls go last whatever the direction.
fn sort(table: &Table, rules: &[SortRule]) -> Result<Table> {
    let keys = rules
        .iter()
        .map(|rule| {
            table
                .column(&rule.column)
                .map(|column| (column, rule.ascending))
                .ok_or_else(|| SiftError::missing_column(Stage::Sort, &rule.column))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut order: Vec<usize> = (0..table.row_count()).collect();
    order.sort_by(|&a, &b| {
        for (column, ascending) in &keys {
            let (Some(left), Some(right)) = (column.get(a), column.get(b)) else {
                continue;
            };
            let ordering = match left.sort_cmp(right) {
                o if *ascending || left.is_null() || right.is_null() => o,
                o => o.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    Ok(table.take_rows(&order))
}
