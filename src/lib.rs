//! # tablesift - declarative table querying
//!
//! tablesift loads a delimited text table, infers a semantic type for every column,
//! and runs a declarative [`pipeline::PipelineConfig`] over it: projection, filtering,
//! sorting, then optional grouping with aggregation. Results export as CSV or as JSON
//! records.
//!
//! ## Quick Start
//!
//! ```
//! use tablesift::export::{ExportFormat, export};
//! use tablesift::pipeline::{AggregateFunction, AggregationRule, GroupSpec, PipelineConfig, run};
//! use tablesift::table::{LoadOptions, load_csv};
//!
//! let table = load_csv("group,val\nx,1\nx,2\ny,3\n".as_bytes(), &LoadOptions::default())?;
//!
//! let config = PipelineConfig {
//!     grouping: GroupSpec::by(["group"]),
//!     aggregations: vec![AggregationRule::new("val", AggregateFunction::Sum)],
//!     ..PipelineConfig::default()
//! };
//!
//! let result = run(&table, &config)?;
//! assert_eq!(export(&result, ExportFormat::Csv)?, b"group,val_sum\nx,3\ny,3\n");
//! # Ok::<(), tablesift::error::SiftError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`table`]: column model, type inference, and CSV loading
//! - [`pipeline`]: configuration codec, validation, predicates, and the executor
//! - [`export`]: CSV and JSON record serialization
//! - [`session`]: caller-owned working state with configuration history
//! - [`config`]: persisted application settings
//! - [`logging`]: tracing subscriber setup
//! - [`error`]: error types and handling utilities
//!
//! Configurations are plain JSON, so they can be saved, shared, and replayed:
//!
//! ```
//! use tablesift::pipeline::{PipelineConfig, decode_config, encode_config};
//!
//! let config = decode_config(br#"{"sorting": [{"column": "age", "ascending": false}]}"#)?;
//! assert_eq!(decode_config(&encode_config(&config)?)?, config);
//! # Ok::<(), tablesift::error::SiftError>(())
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod session;
pub mod table;
