//! Error types for netplot.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for netplot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while fetching tables or preparing a plot.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// No JSON or CSV file exists for the table.
    #[error("table '{name}' not found in {}", dir.display())]
    TableNotFound { name: String, dir: PathBuf },

    /// A column the plot depends on is absent.
    #[error("table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },

    /// A cell holds the wrong kind of value.
    #[error("table '{table}', column '{column}', row {row}: expected {expected}")]
    ColumnType {
        table: String,
        column: String,
        row: usize,
        expected: &'static str,
    },

    /// Columns of one table have different lengths.
    #[error("table '{table}' has columns of different lengths")]
    RaggedTable { table: String },

    /// An edge endpoint has no row in the node table.
    #[error("node '{0}' appears in an edge but not in the node table")]
    MissingNode(String),

    /// A filter predicate could not be parsed.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// The configured colormap name is not known.
    #[error("unknown colormap '{0}'")]
    UnknownColormap(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
