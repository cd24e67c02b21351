//! Error types for upsync-core.

use crate::sync::Stage;
use crate::validate::ValidationError;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can end a sync attempt.
///
/// Everything up to and including `Fetch` aborts the run before the remote
/// is touched. `SyncRejected` is the expected failure of the network steps
/// and only appears once both of them have been attempted.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed identity or credential input.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Required credential material or key artifact is missing.
    #[error("authentication unavailable: {0}")]
    AuthenticationUnavailable(String),

    /// The remote address could not be built from host, owner and name.
    #[error("invalid remote address: {0}")]
    InvalidRemote(String),

    /// Setting the global git preferences failed.
    #[error("failed to configure git: {0}")]
    RepositoryConfig(String),

    /// The working directory is not inside a git working tree.
    #[error("not a git repository - run `git init` first: {0}")]
    NotARepository(String),

    /// `git status` could not be queried.
    #[error("failed to query working tree status: {0}")]
    StatusQuery(String),

    /// Staging or committing local changes failed.
    #[error("failed to commit local changes: {0}")]
    Commit(String),

    /// Switching to the target branch failed.
    #[error("failed to check out '{branch}': {stderr}")]
    Checkout { branch: String, stderr: String },

    /// Fetching the target branch failed.
    #[error("failed to fetch '{branch}': {stderr}")]
    Fetch { branch: String, stderr: String },

    /// Pull and/or push finished with a non-zero status.
    #[error("sync rejected by remote (pull: {}, push: {})", or_ok(.pull_stderr), or_ok(.push_stderr))]
    SyncRejected {
        /// Captured stderr of the pull, `None` if it succeeded.
        pull_stderr: Option<String>,
        /// Captured stderr of the push, `None` if it succeeded.
        push_stderr: Option<String>,
    },

    /// Git could not be run at all.
    #[error("git error: {0}")]
    Git(#[from] upsync_git::Error),

    /// IO error (config or log file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Sync stage that produced this error, `None` for errors raised before
    /// the run started or outside any stage.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::RepositoryConfig(_) => Some(Stage::Configure),
            Self::NotARepository(_) => Some(Stage::VerifyRepo),
            Self::StatusQuery(_) => Some(Stage::DetectChanges),
            Self::Commit(_) => Some(Stage::StageAndCommit),
            Self::Checkout { .. } => Some(Stage::Checkout),
            Self::Fetch { .. } => Some(Stage::Fetch),
            Self::SyncRejected { .. } => Some(Stage::Verdict),
            _ => None,
        }
    }
}

fn or_ok(stderr: &Option<String>) -> &str {
    stderr.as_deref().unwrap_or("ok")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_names_failed_steps() {
        let err = Error::SyncRejected {
            pull_stderr: Some("CONFLICT (content): Merge conflict in a.txt".into()),
            push_stderr: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("pull: CONFLICT"));
        assert!(msg.contains("push: ok"));
    }

    #[test]
    fn test_stage_mapping() {
        assert_eq!(
            Error::Fetch {
                branch: "main".into(),
                stderr: String::new()
            }
            .stage(),
            Some(Stage::Fetch)
        );
        assert_eq!(Error::Commit(String::new()).stage(), Some(Stage::StageAndCommit));
        assert_eq!(Error::AuthenticationUnavailable(String::new()).stage(), None);
    }

    #[test]
    fn test_validation_wraps_reason() {
        let err = Error::from(ValidationError::OwnerMissing);
        assert_eq!(err.to_string(), "invalid input: owner missing");
    }
}
