//! Append-only audit log of a sync run.
//!
//! An [`AuditLog`] is created once by the caller and passed by reference to
//! everything that records progress. Each record is one line,
//! `{timestamp} - {LEVEL} - {message}`, written and flushed before the
//! recording call returns, so an interrupted run still leaves its trail.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Local;

/// File name used when no log path is configured.
pub const DEFAULT_LOG_FILE: &str = "upsync.log";

/// Where the log goes when no path is configured.
///
/// Inside a repository this is the git directory, so the log never shows up
/// as a working tree change. Outside one it is the per-user data directory.
#[must_use]
pub fn default_log_path(workdir: &Path) -> PathBuf {
    find_git_dir(workdir)
        .or_else(|| dirs::data_local_dir().map(|dir| dir.join("upsync")))
        .unwrap_or_else(|| workdir.to_path_buf())
        .join(DEFAULT_LOG_FILE)
}

/// Nearest `.git` directory at or above `start`.
fn find_git_dir(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        let dotgit = dir.join(".git");
        if dotgit.is_dir() {
            return Some(dotgit);
        }
        // Linked worktrees and submodules have a `gitdir: <path>` file instead.
        let content = fs::read_to_string(&dotgit).ok()?;
        let target = content.trim().strip_prefix("gitdir:")?.trim();
        Some(dir.join(target))
    })
}

/// Severity of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        })
    }
}

/// Audit log handle.
pub struct AuditLog {
    sink: Mutex<Box<dyn Write + Send>>,
    path: Option<PathBuf>,
}

impl AuditLog {
    /// Open (or create) a log file in append mode, creating missing parent
    /// directories. The stored path is canonical.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened for appending.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            sink: Mutex::new(Box::new(file)),
            path: Some(fs::canonicalize(path)?),
        })
    }

    /// Write records to an arbitrary sink.
    #[must_use]
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(writer)),
            path: None,
        }
    }

    /// Log kept in memory, plus a handle to read it back.
    #[must_use]
    pub fn in_memory() -> (Self, MemoryLog) {
        let buffer = MemoryLog::default();
        (Self::from_writer(buffer.clone()), buffer)
    }

    /// Path of the backing file, if the log is file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one record.
    ///
    /// Multi-line messages are folded onto a single line joined by ` | `.
    /// A failing sink is reported through `tracing` and never aborts the
    /// caller.
    pub fn record(&self, level: Level, message: impl AsRef<str>) {
        let message = fold_lines(message.as_ref());

        match level {
            Level::Info => tracing::info!(target: "upsync::audit", "{message}"),
            Level::Warning => tracing::warn!(target: "upsync::audit", "{message}"),
            Level::Error => tracing::error!(target: "upsync::audit", "{message}"),
        }

        let line = format!(
            "{} - {level} - {message}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f")
        );

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = sink.write_all(line.as_bytes()).and_then(|()| sink.flush()) {
            tracing::warn!(error = %e, "failed to write audit record");
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(Level::Info, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.record(Level::Warning, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.record(Level::Error, message);
    }
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn fold_lines(message: &str) -> String {
    message
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Shared in-memory buffer behind [`AuditLog::in_memory`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemoryLog {
    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Written records, one per element.
    #[cfg(test)]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }
}

impl Write for MemoryLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
