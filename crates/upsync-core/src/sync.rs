//! Sync engine: commit local edits, rebase onto the remote branch, push.
//!
//! The run is a linear sequence of [`Stage`]s. Everything up to `Fetch` is a
//! hard precondition and aborts with a typed [`Error`]. Pull and push are
//! expected to fail in normal operation (conflicts, rejected pushes), so
//! their output is captured and judged together at the end.

use std::fmt;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use upsync_git::{CommandOutput, GitRunner};

use crate::audit::{AuditLog, Level};
use crate::auth::RemoteEndpoint;
use crate::branch_name::BranchName;
use crate::error::{Error, Result};

/// Global git preferences set before every run.
const GLOBAL_PREFERENCES: [(&str, &str); 2] =
    [("pull.rebase", "true"), ("push.autoSetupRemote", "true")];

/// Steps of a sync run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Configure,
    VerifyRepo,
    DetectChanges,
    StageAndCommit,
    Checkout,
    Fetch,
    PullRebase,
    Push,
    Verdict,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Self; 9] = [
        Self::Configure,
        Self::VerifyRepo,
        Self::DetectChanges,
        Self::StageAndCommit,
        Self::Checkout,
        Self::Fetch,
        Self::PullRebase,
        Self::Push,
        Self::Verdict,
    ];

    /// Tag used in audit records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configure => "CONFIGURE",
            Self::VerifyRepo => "VERIFY_REPO",
            Self::DetectChanges => "DETECT_CHANGES",
            Self::StageAndCommit => "STAGE_AND_COMMIT",
            Self::Checkout => "CHECKOUT",
            Self::Fetch => "FETCH",
            Self::PullRebase => "PULL_REBASE",
            Self::Push => "PUSH",
            Self::Verdict => "VERDICT",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    /// True iff both pull and push exited with status zero.
    pub succeeded: bool,
    /// Last stage the run reached.
    pub stage: Stage,
    /// Whether local changes were committed during the run.
    pub committed: bool,
    /// Captured pull output, secrets redacted.
    pub pull: Option<CommandOutput>,
    /// Captured push output, secrets redacted.
    pub push: Option<CommandOutput>,
}

impl SyncOutcome {
    /// Outcome of a run that stopped at a hard precondition.
    #[must_use]
    pub const fn aborted(stage: Stage) -> Self {
        Self {
            succeeded: false,
            stage,
            committed: false,
            pull: None,
            push: None,
        }
    }

    /// The `SyncRejected` error describing a failed verdict, if any.
    #[must_use]
    pub fn rejection(&self) -> Option<Error> {
        if self.succeeded || self.stage != Stage::Verdict {
            return None;
        }
        let failed = |out: &Option<CommandOutput>| {
            out.as_ref()
                .filter(|o| !o.success())
                .map(|o| o.stderr_trimmed().to_string())
        };
        Some(Error::SyncRejected {
            pull_stderr: failed(&self.pull),
            push_stderr: failed(&self.push),
        })
    }
}

/// Commit message for automated commits: `Automated commit: YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn commit_message(at: NaiveDateTime) -> String {
    format!("Automated commit: {}", at.format("%Y-%m-%d %H:%M:%S"))
}

/// Runs the sync sequence against a [`GitRunner`], recording every step.
pub struct Orchestrator<'a, G: GitRunner> {
    git: &'a G,
    audit: &'a AuditLog,
}

impl<'a, G: GitRunner> Orchestrator<'a, G> {
    /// Create an orchestrator over a git runner and an audit log.
    #[must_use]
    pub const fn new(git: &'a G, audit: &'a AuditLog) -> Self {
        Self { git, audit }
    }

    /// Synchronize `branch` with `endpoint`.
    ///
    /// Returns `Ok` once pull and push have both been attempted, whatever
    /// their exit status; check [`SyncOutcome::succeeded`].
    ///
    /// # Errors
    /// Returns the typed error of the first failing precondition stage, or
    /// [`Error::Git`] if git could not be run at all.
    pub fn run(&self, endpoint: &RemoteEndpoint, branch: &BranchName) -> Result<SyncOutcome> {
        Run {
            git: self.git,
            audit: self.audit,
            endpoint,
            branch: branch.as_str(),
        }
        .execute()
    }
}

/// State of one run.
struct Run<'a, G: GitRunner> {
    git: &'a G,
    audit: &'a AuditLog,
    endpoint: &'a RemoteEndpoint,
    branch: &'a str,
}

impl<G: GitRunner> Run<'_, G> {
    fn execute(&self) -> Result<SyncOutcome> {
        let branch = self.branch;
        let remote = self.endpoint.expose_url();

        self.log(
            Stage::Configure,
            Level::Info,
            "setting global pull.rebase and push.autoSetupRemote",
        );
        for (key, value) in GLOBAL_PREFERENCES {
            self.require(
                Stage::Configure,
                &["config", "--global", key, value],
                Error::RepositoryConfig,
            )?;
        }

        self.log(
            Stage::VerifyRepo,
            Level::Info,
            format!("checking {} is a git working tree", self.git.workdir().display()),
        );
        self.require(
            Stage::VerifyRepo,
            &["rev-parse", "--is-inside-work-tree"],
            Error::NotARepository,
        )?;

        let log_exclude = self.log_pathspec();

        self.log(Stage::DetectChanges, Level::Info, "querying working tree status");
        let status_args = scoped(&["status", "--porcelain"], log_exclude.as_deref());
        let status = self.require(
            Stage::DetectChanges,
            &as_strs(&status_args),
            Error::StatusQuery,
        )?;
        let pending = status.stdout.lines().filter(|l| !l.trim().is_empty()).count();

        let committed = if pending > 0 {
            self.log(
                Stage::StageAndCommit,
                Level::Info,
                format!("{pending} uncommitted change(s) detected, staging and committing"),
            );
            let message = commit_message(Local::now().naive_local());
            let add_args = scoped(&["add", "--all"], log_exclude.as_deref());
            self.require(Stage::StageAndCommit, &as_strs(&add_args), Error::Commit)?;
            self.require(
                Stage::StageAndCommit,
                &["commit", "-m", &message],
                Error::Commit,
            )?;
            self.log(
                Stage::StageAndCommit,
                Level::Info,
                format!("created commit '{message}'"),
            );
            true
        } else {
            self.log(
                Stage::StageAndCommit,
                Level::Info,
                "working tree clean, skipping commit",
            );
            false
        };

        self.log(Stage::Checkout, Level::Info, format!("checking out '{branch}'"));
        self.require(Stage::Checkout, &["checkout", branch], |stderr| {
            Error::Checkout {
                branch: branch.to_string(),
                stderr,
            }
        })?;

        self.log(
            Stage::Fetch,
            Level::Info,
            format!("fetching '{branch}' from {}", self.endpoint),
        );
        self.require(Stage::Fetch, &["fetch", remote, branch], |stderr| {
            Error::Fetch {
                branch: branch.to_string(),
                stderr,
            }
        })?;

        self.log(
            Stage::PullRebase,
            Level::Info,
            format!("pulling '{branch}' with rebase"),
        );
        let pull = self.capture(Stage::PullRebase, &["pull", "--rebase", remote, branch])?;
        self.log(
            Stage::PullRebase,
            Level::Info,
            format!("Pull result: {}", pull.stdout),
        );

        self.log(Stage::Push, Level::Info, format!("pushing '{branch}'"));
        let push = self.capture(Stage::Push, &["push", remote, branch])?;
        self.log(
            Stage::Push,
            Level::Info,
            format!("Push result: {}", push.stdout),
        );

        self.log(Stage::Verdict, Level::Info, "evaluating pull and push results");
        let succeeded = pull.success() && push.success();
        if succeeded {
            self.log(
                Stage::Verdict,
                Level::Info,
                "synchronization completed successfully",
            );
        } else {
            for (step, out) in [("Pull", &pull), ("Push", &push)] {
                if !out.success() {
                    self.log(
                        Stage::Verdict,
                        Level::Error,
                        format!(
                            "Sync failed. {step} exited with status {}. {step} stderr: {}",
                            out.status_label(),
                            out.stderr_trimmed()
                        ),
                    );
                }
            }
        }

        Ok(SyncOutcome {
            succeeded,
            stage: Stage::Verdict,
            committed,
            pull: Some(pull),
            push: Some(push),
        })
    }

    /// Pathspec excluding the audit log when it sits inside the working tree.
    fn log_pathspec(&self) -> Option<String> {
        let relative = self.audit.path()?.strip_prefix(self.git.workdir()).ok()?;
        if relative.starts_with(".git") {
            return None;
        }
        Some(format!(":(exclude){}", relative.display()))
    }

    /// Run a command and return its output with secrets scrubbed, whatever
    /// the exit status.
    fn capture(&self, stage: Stage, args: &[&str]) -> Result<CommandOutput> {
        let shown = self.endpoint.redact(&args.join(" "));

        let output = match self.git.run(args) {
            Ok(output) => output,
            Err(e) => {
                let err = Error::from(e);
                self.log(stage, Level::Error, format!("git {shown} could not be run: {err}"));
                return Err(err);
            }
        };

        self.log(
            stage,
            Level::Info,
            format!("git {shown} exited with status {}", output.status_label()),
        );

        Ok(CommandOutput {
            status: output.status,
            stdout: self.endpoint.redact(&output.stdout),
            stderr: self.endpoint.redact(&output.stderr),
        })
    }

    /// Run a command that must succeed, mapping a non-zero exit to `fail`.
    fn require(
        &self,
        stage: Stage,
        args: &[&str],
        fail: impl FnOnce(String) -> Error,
    ) -> Result<CommandOutput> {
        let output = self.capture(stage, args)?;
        if output.success() {
            return Ok(output);
        }

        let err = fail(output.stderr_trimmed().to_string());
        self.log(stage, Level::Error, err.to_string());
        Err(err)
    }

    fn log(&self, stage: Stage, level: Level, message: impl AsRef<str>) {
        self.audit
            .record(level, format!("[{stage}] {}", message.as_ref()));
    }
}

/// `base` followed by `-- :/ {exclude}` when there is something to exclude.
fn scoped(base: &[&str], exclude: Option<&str>) -> Vec<String> {
    let mut args: Vec<String> = base.iter().map(ToString::to_string).collect();
    if let Some(exclude) = exclude {
        args.extend(["--", ":/", exclude].map(String::from));
    }
    args
}

fn as_strs(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}
