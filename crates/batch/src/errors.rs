use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while bringing a batch process up.
///
/// All of these occur before any logging sink exists, so they are printed
/// to stderr by the entry point rather than logged.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("unknown configuration: {0}")]
    UnknownConfig(String),

    #[error("log directory does not exist: {0}")]
    LogDirMissing(PathBuf),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
