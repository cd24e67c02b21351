//! Trait abstraction over git invocation.
//!
//! The sync orchestrator only ever talks to a [`GitRunner`], so tests can
//! substitute a scripted implementation for the real binary.

use std::path::Path;

use crate::{CommandOutput, Result};

/// Executes git commands against one working directory.
///
/// Calls block until the child exits. There is no timeout: a hung remote
/// hangs the caller.
#[allow(clippy::missing_errors_doc)]
pub trait GitRunner {
    /// Directory the commands run in.
    fn workdir(&self) -> &Path;

    /// Run `git <args...>` and capture its exit status, stdout and stderr.
    ///
    /// Returns `Err` only when the process could not be run at all; a
    /// non-zero exit is reported through [`CommandOutput::success`].
    fn run(&self, args: &[&str]) -> Result<CommandOutput>;
}
