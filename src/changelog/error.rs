//! Changelog-specific error handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a changelog generation run.
///
/// Every variant is fatal: a run either produces a complete changelog or
/// leaves the destination untouched.
#[derive(Error, Debug)]
pub enum ChangelogError {
    /// Invalid configuration (bad insert type, unknown partial, malformed pattern).
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The explicit log file does not exist.
    #[error("Log file does not exist: {0}")]
    MissingInput(PathBuf),

    /// The external log command failed to spawn or exited non-zero.
    #[error("Log source failed: {0}")]
    LogSource(String),
}

// Note: anyhow already has a blanket impl for thiserror::Error types
