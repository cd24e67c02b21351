//! Captured result of a single git invocation.

use std::process::Output;

use serde::Serialize;

/// Exit status plus captured text streams of a finished git process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Captured standard error, lossily decoded as UTF-8.
    pub stderr: String,
}

impl CommandOutput {
    /// Build an output with the given exit code.
    #[must_use]
    pub fn new(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }

    /// Exit status rendered for log lines (`signal` when killed).
    #[must_use]
    pub fn status_label(&self) -> String {
        self.status
            .map_or_else(|| "signal".to_string(), |code| code.to_string())
    }

    /// Stderr with surrounding whitespace removed.
    #[must_use]
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_only_on_zero() {
        assert!(CommandOutput::new(0, "", "").success());
        assert!(!CommandOutput::new(1, "", "boom").success());
        assert!(!CommandOutput::default().success());
    }

    #[test]
    fn test_status_label() {
        assert_eq!(CommandOutput::new(128, "", "").status_label(), "128");
        assert_eq!(CommandOutput::default().status_label(), "signal");
    }

    #[test]
    fn test_stderr_trimmed() {
        let out = CommandOutput::new(1, "", "  fatal: no remote\n");
        assert_eq!(out.stderr_trimmed(), "fatal: no remote");
    }
}
