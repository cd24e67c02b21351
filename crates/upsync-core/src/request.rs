//! The validated input of one sync run.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::branch_name::BranchName;
use crate::validate::{ValidationError, validate_inputs};

/// How the remote is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// SSH key pair found on disk.
    #[default]
    Key,
    /// Bearer token embedded in the HTTPS address.
    Token,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key => f.write_str("key"),
            Self::Token => f.write_str("token"),
        }
    }
}

/// Identity, credentials and target branch for one sync.
///
/// Only constructible through [`SyncRequest::new`], so a value of this type
/// always satisfies the validation rules.
#[derive(Debug)]
pub struct SyncRequest {
    owner: String,
    name: String,
    mode: AuthMode,
    secret: Option<SecretString>,
    branch: BranchName,
}

impl SyncRequest {
    /// Validate the inputs and build a request.
    ///
    /// `branch` falls back to `main` when `None`.
    ///
    /// # Errors
    /// Returns the first failed [`ValidationError`].
    pub fn new(
        owner: &str,
        name: &str,
        secret: Option<&str>,
        mode: AuthMode,
        branch: Option<&str>,
    ) -> Result<Self, ValidationError> {
        validate_inputs(owner, name, secret, mode)?;
        let branch = branch.map_or_else(|| Ok(BranchName::default()), BranchName::new)?;

        Ok(Self {
            owner: owner.trim().to_string(),
            name: name.trim().to_string(),
            mode,
            secret: secret
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
            branch,
        })
    }

    /// Owner handle (user or organization).
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Authentication mode.
    #[must_use]
    pub const fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Secret material, if any was supplied.
    #[must_use]
    pub const fn secret(&self) -> Option<&SecretString> {
        self.secret.as_ref()
    }

    /// Branch to synchronize.
    #[must_use]
    pub const fn branch(&self) -> &BranchName {
        &self.branch
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_new_trims_identity() {
        let req = SyncRequest::new(" octocat ", " hello\n", Some(" tok "), AuthMode::Token, None)
            .unwrap();
        assert_eq!(req.owner(), "octocat");
        assert_eq!(req.name(), "hello");
        assert_eq!(req.secret().unwrap().expose_secret(), "tok");
        assert_eq!(req.branch().as_str(), "main");
    }

    #[test]
    fn test_new_rejects_invalid_input() {
        let err = SyncRequest::new("", "x", Some("y"), AuthMode::Token, None).unwrap_err();
        assert_eq!(err, ValidationError::OwnerMissing);
    }

    #[test]
    fn test_new_rejects_bad_branch() {
        let err = SyncRequest::new("x", "y", None, AuthMode::Key, Some("--force")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBranch { .. }));
    }

    #[test]
    fn test_empty_secret_dropped_in_key_mode() {
        let req = SyncRequest::new("x", "y", Some("  "), AuthMode::Key, Some("dev")).unwrap();
        assert!(req.secret().is_none());
        assert_eq!(req.branch().as_str(), "dev");
    }

    #[test]
    fn test_debug_hides_secret() {
        let req = SyncRequest::new("x", "y", Some("hunter2"), AuthMode::Token, None).unwrap();
        assert!(!format!("{req:?}").contains("hunter2"));
    }

    #[test]
    fn test_auth_mode_display() {
        assert_eq!(AuthMode::Key.to_string(), "key");
        assert_eq!(AuthMode::Token.to_string(), "token");
    }
}
