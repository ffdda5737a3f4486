use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors returned by the table I/O layer.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("null value in column {column} at row {row}")]
    Null { column: String, row: usize },

    #[error("line {0}: {1}")]
    Parse(usize, String),
}
