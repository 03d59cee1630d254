//! Centralized error handling for tablesift.
//!
//! Every public operation returns [`Result`], whose error side is [`SiftError`].
//! The variants follow the three places a run can go wrong:
//!
//! - [`SiftError::Load`]: the source table could not be read or parsed.
//! - [`SiftError::Config`]: the pipeline configuration is malformed or asks for
//!   something impossible (unknown operator code, bad regular expression, ...).
//! - [`SiftError::Execution`]: a stage failed, always attributable to a [`Stage`]
//!   and a column.
//!
//! ```
//! use tablesift::error::SiftError;
//! use tablesift::pipeline::Stage;
//!
//! fn describe(err: &SiftError) -> String {
//!     match err {
//!         SiftError::Execution { stage, column, .. } => format!("{stage} failed on {column}"),
//!         other => other.to_string(),
//!     }
//! }
//!
//! let err = SiftError::missing_column(Stage::Filter, "price");
//! assert_eq!(describe(&err), "filter failed on price");
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! [`SiftError`]:
//!
//! ```no_run
//! use tablesift::error::ResultExt as _;
//!
//! fn read_table() -> tablesift::error::Result<String> {
//!     std::fs::read_to_string("data.csv").context("Failed to read table")
//! }
//! ```

use crate::pipeline::Stage;
use std::fmt;

/// Main error type for tablesift operations.
#[derive(Debug)]
pub enum SiftError {
    /// I/O errors (reading tables, writing exports, settings files)
    Io(std::io::Error),

    /// Malformed or unreadable source table
    Load(String),

    /// Malformed configuration, unknown codes, invalid regular expressions
    Config(String),

    /// Stage-level failure during a pipeline run
    Execution {
        stage: Stage,
        column: String,
        message: String,
    },

    /// Generic error with context
    Other(String),
}

impl SiftError {
    /// A stage referenced a column the current table does not have.
    pub fn missing_column(stage: Stage, column: impl Into<String>) -> Self {
        Self::Execution {
            stage,
            column: column.into(),
            message: "column not found".to_owned(),
        }
    }

    pub fn execution(stage: Stage, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            stage,
            column: column.into(),
            message: message.into(),
        }
    }

    /// The stage this error is attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Execution { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl fmt::Display for SiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Load(msg) => write!(f, "Load error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Execution {
                stage,
                column,
                message,
            } => write!(f, "Execution error in {stage} stage, column '{column}': {message}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SiftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SiftError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SiftError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<csv::Error> for SiftError {
    fn from(err: csv::Error) -> Self {
        Self::Load(err.to_string())
    }
}

impl From<regex::Error> for SiftError {
    fn from(err: regex::Error) -> Self {
        Self::Config(format!("Invalid regular expression: {err}"))
    }
}

// UI collaborators surface errors as plain messages
impl From<SiftError> for String {
    fn from(err: SiftError) -> Self {
        err.to_string()
    }
}

/// Result type alias for tablesift operations.
pub type Result<T> = std::result::Result<T, SiftError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SiftError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: SiftError = e.into();
            SiftError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: SiftError = e.into();
            SiftError::Other(format!("{}: {}", f(), err))
        })
    }
}
