//! Mock implementations for testing the sync engine.
//!
//! `MockGit` implements `GitRunner` without spawning anything: it records
//! every argument vector and answers from a table keyed by git subcommand.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use upsync_git::{CommandOutput, GitRunner, Result as GitResult};

/// Scripted `GitRunner`. Unscripted subcommands succeed with empty output,
/// so a default mock describes a clean tree whose remote steps all pass.
pub struct MockGit {
    workdir: PathBuf,
    responses: HashMap<String, CommandOutput>,
    spawn_failures: HashSet<String>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl Default for MockGit {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGit {
    pub fn new() -> Self {
        Self {
            workdir: PathBuf::from("/work/hello"),
            responses: HashMap::new(),
            spawn_failures: HashSet::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_workdir(mut self, workdir: &Path) -> Self {
        self.workdir = workdir.to_path_buf();
        self
    }

    pub fn with_response(mut self, subcommand: &str, output: CommandOutput) -> Self {
        self.responses.insert(subcommand.to_string(), output);
        self
    }

    pub fn with_failure(self, subcommand: &str, stderr: &str) -> Self {
        self.with_response(subcommand, CommandOutput::new(1, "", stderr))
    }

    pub fn with_dirty_tree(self) -> Self {
        self.with_response("status", CommandOutput::new(0, " M src/lib.rs\n?? notes.txt\n", ""))
    }

    pub fn with_spawn_failure(mut self, subcommand: &str) -> Self {
        self.spawn_failures.insert(subcommand.to_string());
        self
    }

    /// Every recorded argument vector, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// First argument of every call.
    pub fn subcommands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| c.first().cloned())
            .collect()
    }

    /// Calls whose subcommand is `subcommand`.
    pub fn calls_for(&self, subcommand: &str) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.first().is_some_and(|s| s == subcommand))
            .cloned()
            .collect()
    }

    pub fn count(&self, subcommand: &str) -> usize {
        self.calls_for(subcommand).len()
    }
}

impl GitRunner for MockGit {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run(&self, args: &[&str]) -> GitResult<CommandOutput> {
        self.calls
            .borrow_mut()
            .push(args.iter().map(ToString::to_string).collect());

        let subcommand = args.first().copied().unwrap_or_default();
        if self.spawn_failures.contains(subcommand) {
            return Err(upsync_git::Error::Spawn {
                command: subcommand.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "git: command not found"),
            });
        }

        Ok(self
            .responses
            .get(subcommand)
            .cloned()
            .unwrap_or_else(|| CommandOutput::new(0, "", "")))
    }
}
