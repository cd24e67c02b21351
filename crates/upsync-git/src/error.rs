//! Error types for upsync-git.

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the subprocess layer itself.
///
/// A git command that runs and exits non-zero is not an error at this level;
/// it is reported through [`crate::CommandOutput`] so callers decide whether
/// the failure is fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The working directory handed to the runner does not exist.
    #[error("working directory not found: {}", .0.display())]
    WorkdirNotFound(PathBuf),

    /// The `git` process could not be spawned or waited on.
    #[error("failed to run git {command}: {source}")]
    Spawn {
        /// Git subcommand that was being launched.
        command: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}
