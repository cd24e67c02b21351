//! `git` binary runner bound to a working directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};
use crate::output::CommandOutput;
use crate::traits::GitRunner;

/// Runs the system `git` binary inside a fixed working directory.
pub struct Repository {
    workdir: PathBuf,
    program: PathBuf,
}

impl Repository {
    /// Bind a runner to the given directory, stored in canonical form.
    ///
    /// The directory does not have to be a git working tree; that is checked
    /// later with `git rev-parse --is-inside-work-tree`.
    ///
    /// # Errors
    /// Returns `WorkdirNotFound` if the path is not an existing directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::WorkdirNotFound(path.to_path_buf()));
        }
        let workdir = path
            .canonicalize()
            .map_err(|_| Error::WorkdirNotFound(path.to_path_buf()))?;

        Ok(Self {
            workdir,
            program: PathBuf::from("git"),
        })
    }

    /// Bind a runner to the current directory.
    ///
    /// # Errors
    /// Returns error if the current directory cannot be resolved.
    pub fn open_current() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|source| Error::Spawn {
            command: "current_dir".into(),
            source,
        })?;
        Self::open(cwd)
    }

    /// Use a different git executable than the one on `PATH`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl GitRunner for Repository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        // Only the subcommand is traced: later arguments may embed a token.
        let command = args.first().copied().unwrap_or_default().to_string();
        debug!(%command, workdir = %self.workdir.display(), "spawning git");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;

        let output = CommandOutput::from(output);
        debug!(%command, status = %output.status_label(), "git exited");
        Ok(output)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("workdir", &self.workdir)
            .finish_non_exhaustive()
    }
}
