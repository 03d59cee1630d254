//! Declarative pipeline configuration and execution.
//!
//! A [`PipelineConfig`] describes up to four stages that always run in the same order:
//!
//! 1. **Projection**: keep `selected_columns` in listed order (all columns when empty)
//! 2. **Filtering**: keep rows matching every [`FilterRule`]
//! 3. **Sorting**: stable multi-key sort by [`SortRule`]s, nulls last
//! 4. **Grouping/Aggregation**: partition by key columns and apply [`AggregationRule`]s
//!
//! Configs are validated against the input schema before any stage runs, so a run
//! either produces a complete result or fails without side effects.
//!
//! # Example
//!
//! ```
//! use tablesift::pipeline::{FilterOperator, FilterRule, PipelineConfig, SortRule, run};
//! use tablesift::table::{LoadOptions, load_csv};
//!
//! let table = load_csv("name,age\nbob,25\nalice,30\neve,17\n".as_bytes(), &LoadOptions::default())?;
//! let config = PipelineConfig {
//!     filters: vec![FilterRule::new("age", FilterOperator::Ge, "18")],
//!     sorting: vec![SortRule::asc("name")],
//!     ..PipelineConfig::default()
//! };
//!
//! let result = run(&table, &config)?;
//! assert_eq!(result.row_count(), 2);
//! # Ok::<(), tablesift::error::SiftError>(())
//! ```

pub mod aggregate;
pub mod executor;
pub mod predicate;
pub mod spec;
pub mod validation;

pub use aggregate::{aggregate_column_name, group_and_aggregate};
pub use executor::{RunReport, Stage, run, run_with_report};
pub use predicate::{Predicate, evaluate};
pub use spec::{
    AggregateFunction, AggregationRule, FilterOperator, FilterRule, GroupSpec, PipelineConfig,
    SortRule, decode_config, encode_config,
};
pub use validation::{Problem, ValidationError, validate_pipeline};
