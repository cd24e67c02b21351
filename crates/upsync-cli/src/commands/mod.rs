//! Command-line surface.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use upsync_core::Config;
use upsync_core::auth::token_from_env;
use upsync_core::config::CONFIG_FILE;
use upsync_core::request::AuthMode;

use crate::output;

pub mod check;
pub mod sync;

/// upsync - commit local edits, rebase onto the remote branch and push.
#[derive(Debug, Parser)]
#[command(name = "upsync", version, about, long_about = None)]
pub struct Cli {
    /// Show progress on stderr (repeat for debug output).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Commit, pull with rebase and push the current working copy.
    Sync(SyncArgs),

    /// Validate inputs and credentials without running git.
    Check(RemoteArgs),
}

/// Identity and credential flags shared by every command.
#[derive(Debug, Args)]
pub struct RemoteArgs {
    /// Repository owner (user or organization).
    #[arg(long, default_value = "")]
    pub owner: String,

    /// Repository name.
    #[arg(long = "repo", default_value = "")]
    pub repo: String,

    /// Personal access token (falls back to the configured environment variable).
    #[arg(long)]
    pub token: Option<String>,

    /// Authentication method (default: token if one is available, else key).
    #[arg(long, value_enum)]
    pub auth: Option<AuthArg>,

    /// Branch to synchronize (default from config, else `main`).
    #[arg(short, long)]
    pub branch: Option<String>,

    /// SSH key checked in key mode.
    #[arg(long)]
    pub key_path: Option<PathBuf>,

    /// Remote host.
    #[arg(long)]
    pub host: Option<String>,

    /// Configuration file.
    #[arg(long, default_value = CONFIG_FILE)]
    pub config: PathBuf,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Audit log file (default from config, else `upsync.log` in the git directory).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthArg {
    /// SSH key pair.
    Key,
    /// Personal access token.
    Token,
}

impl From<AuthArg> for AuthMode {
    fn from(arg: AuthArg) -> Self {
        match arg {
            AuthArg::Key => Self::Key,
            AuthArg::Token => Self::Token,
        }
    }
}

/// Flags merged with the config file.
pub struct Resolved {
    pub config: Config,
    pub mode: AuthMode,
    pub token: Option<String>,
    pub branch: String,
    pub key_path: Option<PathBuf>,
    pub host: String,
}

impl RemoteArgs {
    /// Load the config file and apply flag overrides.
    pub fn resolve(&self) -> Result<Resolved> {
        let config = load_config(&self.config)?;

        let explicit = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);
        let token = explicit.or_else(|| {
            (self.auth != Some(AuthArg::Key))
                .then(|| token_from_env(&config.auth.token_env))
                .flatten()
        });

        let mode = self.auth.map_or_else(
            || {
                if token.is_some() {
                    AuthMode::Token
                } else {
                    AuthMode::Key
                }
            },
            AuthMode::from,
        );

        if mode == AuthMode::Key && self.token.is_some() {
            output::warn("--token is ignored with --auth key");
        }

        Ok(Resolved {
            mode,
            token,
            branch: self
                .branch
                .clone()
                .unwrap_or_else(|| config.general.branch.clone()),
            key_path: self.key_path.clone().or_else(|| config.key_path()),
            host: self
                .host
                .clone()
                .unwrap_or_else(|| config.remote.host.clone()),
            config,
        })
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))
}
