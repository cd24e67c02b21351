//! Precondition checks on user-supplied identifiers.
//!
//! These run before anything touches the filesystem or git, so a bad
//! request can always be fixed by asking the user again.

use crate::request::AuthMode;

/// Why a sync request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Owner handle is empty or whitespace.
    #[error("owner missing")]
    OwnerMissing,

    /// Repository name is empty or whitespace.
    #[error("repository name missing")]
    RepositoryMissing,

    /// Token mode was requested without a token.
    #[error("token required for token-based mode")]
    TokenRequired,

    /// Target branch cannot be used as a git argument.
    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranch { name: String, reason: &'static str },
}

/// Check the identity and credential inputs of a sync request.
///
/// Rules are applied in order and the first failure is returned.
///
/// # Errors
/// Returns the [`ValidationError`] of the first rule that fails.
pub fn validate_inputs(
    owner: &str,
    name: &str,
    secret: Option<&str>,
    mode: AuthMode,
) -> Result<(), ValidationError> {
    if owner.trim().is_empty() {
        return Err(ValidationError::OwnerMissing);
    }

    if name.trim().is_empty() {
        return Err(ValidationError::RepositoryMissing);
    }

    if mode == AuthMode::Token && secret.is_none_or(|s| s.trim().is_empty()) {
        return Err(ValidationError::TokenRequired);
    }

    Ok(())
}
