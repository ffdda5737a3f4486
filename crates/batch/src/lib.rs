//! nippan-batch - batch-job lifecycle manager
//!
//! The one cross-cutting component of the pipeline: argument parsing, named
//! configuration resolution, console + file logging, and start/end
//! bookkeeping, bundled into a [`RunContext`] created once per process.

pub mod config;
pub mod context;
pub mod errors;

pub use config::{resolve, JobConfig};
pub use context::{run_job, RunContext, DUMMY_JOB_ID};
pub use errors::BatchError;
