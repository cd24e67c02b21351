//! Target branch newtype.
//!
//! The branch name ends up as a bare argument to `git checkout`, `git fetch`,
//! `git pull` and `git push`, so it is checked against git's ref-name rules
//! and rejected if it could be read as an option.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::validate::ValidationError;

/// Branch used when the caller does not name one.
pub const DEFAULT_BRANCH: &str = "main";

/// A branch name that is safe to pass to git as a positional argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchName(String);

impl BranchName {
    /// Validate and wrap a branch name. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidBranch`] when the name breaks a rule.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ValidationError> {
        let name = name.as_ref().trim();
        if let Some(reason) = violation(name) {
            return Err(ValidationError::InvalidBranch {
                name: name.to_string(),
                reason,
            });
        }
        Ok(Self(name.to_string()))
    }

    /// Get the branch name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BranchName {
    fn default() -> Self {
        Self(DEFAULT_BRANCH.to_string())
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for BranchName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

const SEQUENCES: [(&str, &str); 4] = [
    ("..", "branch name cannot contain '..'"),
    ("//", "branch name cannot contain '//'"),
    ("@{", "branch name cannot contain '@{'"),
    ("/.", "branch name component cannot start with '.'"),
];

/// First rule the name breaks, if any.
fn violation(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("branch name cannot be empty");
    }
    if name == "@" {
        return Some("branch name cannot be '@'");
    }
    if name.starts_with('-') {
        return Some("branch name cannot start with '-'");
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Some("branch name cannot start or end with '.'");
    }
    #[allow(clippy::case_sensitive_file_extension_comparisons)]
    if name.ends_with(".lock") {
        return Some("branch name cannot end with '.lock'");
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Some("branch name cannot start or end with '/'");
    }

    if let Some((_, reason)) = SEQUENCES.iter().find(|(seq, _)| name.contains(seq)) {
        return Some(*reason);
    }

    name.chars().find_map(|c| {
        if c.is_ascii_control() {
            Some("branch name cannot contain control characters")
        } else if matches!(c, ' ' | '~' | '^' | ':' | '?' | '*' | '[' | '\\') {
            Some("branch name cannot contain ' ', '~', '^', ':', '?', '*', '[' or '\\'")
        } else {
            None
        }
    })
}
