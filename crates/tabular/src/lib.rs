//! nippan-tabular - typed table I/O for the batch pipeline
//!
//! Thin, logged wrappers over polars for the file formats the pipeline
//! exchanges: comma CSV, pipe-delimited dat, fixed-width flat files and the
//! binary serialized-table format (Arrow IPC), plus the encoding helpers
//! that hand a table over to the trainer.

pub mod encode;
pub mod errors;
pub mod io;
pub mod spec;

pub use encode::{label_encode, to_matrix};
pub use errors::TableError;
pub use io::{load_csv, load_dat, load_flat, load_table, write_csv, write_table};
pub use spec::{ColumnType, DatSpec, FileSpec, FlatSpec};

// Re-exported so jobs can join and filter without naming polars directly.
pub use polars::prelude::DataFrame;
