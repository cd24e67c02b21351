//! Configuration management for upsync.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::auth::{DEFAULT_HOST, DEFAULT_TOKEN_ENV, default_key_path};
use crate::branch_name::DEFAULT_BRANCH;
use crate::error::Result;

/// File looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = "upsync.toml";

/// upsync configuration loaded from `upsync.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Remote host settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load config from a TOML file, falling back to defaults if it is absent.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Key artifact path with a leading `~` expanded.
    #[must_use]
    pub fn key_path(&self) -> Option<PathBuf> {
        match &self.auth.key_path {
            Some(path) => expand_home(path),
            None => default_key_path(),
        }
    }
}

/// General settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Branch synchronized when none is given.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Audit log location, relative to the working directory.
    ///
    /// Unset means `upsync.log` inside the repository's git directory.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            branch: default_branch(),
            log_file: None,
        }
    }
}

fn default_branch() -> String {
    DEFAULT_BRANCH.into()
}

/// Remote host settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Host the repository lives on.
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.into()
}

/// Authentication settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// SSH key checked in key mode; defaults to `~/.ssh/id_rsa`.
    #[serde(default)]
    pub key_path: Option<String>,

    /// Environment variable holding the token for token mode.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            key_path: None,
            token_env: default_token_env(),
        }
    }
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.into()
}

fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.branch, "main");
        assert!(config.general.log_file.is_none());
        assert_eq!(config.remote.host, "github.com");
        assert_eq!(config.auth.token_env, "GITHUB_TOKEN");
        assert!(config.auth.key_path.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("upsync.toml");
        fs::write(
            &path,
            r#"
[general]
branch = "develop"
log_file = "logs/sync.log"

[remote]
host = "git.example.com"

[auth]
key_path = "/keys/deploy"
token_env = "FORGE_TOKEN"
"#,
        )
        .unwrap();

        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded.general.branch, "develop");
        assert_eq!(loaded.general.log_file, Some(PathBuf::from("logs/sync.log")));
        assert_eq!(loaded.remote.host, "git.example.com");
        assert_eq!(loaded.auth.token_env, "FORGE_TOKEN");
        assert_eq!(loaded.key_path(), Some(PathBuf::from("/keys/deploy")));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("upsync.toml");
        fs::write(&path, "[remote]\nhost = \"gitlab.com\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.remote.host, "gitlab.com");
        assert_eq!(config.general.branch, "main");
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("upsync.toml");
        fs::write(&path, "[general\nbranch = 1").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(crate::Error::Toml(_))
        ));
    }

    #[test]
    fn test_missing_config_returns_default() {
        let config = Config::load("/nonexistent/path/upsync.toml").unwrap();
        assert_eq!(config.remote.host, "github.com");
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/key"), Some(PathBuf::from("/abs/key")));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.ssh/id_ed25519"), Some(home.join(".ssh/id_ed25519")));
            assert_eq!(expand_home("~"), Some(home));
        }
    }
}
