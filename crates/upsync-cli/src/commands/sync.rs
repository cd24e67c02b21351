//! `upsync sync` command - Commit, rebase onto the remote branch and push.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use upsync_core::{
    AuditLog, Stage, SyncContext, SyncOutcome, default_log_path, try_sync_repository,
};
use upsync_git::{CommandOutput, GitRunner, Repository};

use crate::output;

use super::SyncArgs;

/// Run the sync command.
pub fn run(args: &SyncArgs) -> Result<()> {
    let remote = &args.remote;
    let resolved = remote.resolve()?;

    let repo = Repository::open_current().context("Cannot access the working directory")?;

    let log_path = args
        .log_file
        .clone()
        .or_else(|| resolved.config.general.log_file.clone())
        .unwrap_or_else(|| default_log_path(repo.workdir()));
    let audit = AuditLog::open(&log_path)
        .with_context(|| format!("Failed to open audit log {}", log_path.display()))?;
    tracing::debug!(path = %log_path.display(), mode = %resolved.mode, "audit log opened");

    let ctx = SyncContext::new(&repo, &audit)
        .with_key_path(resolved.key_path)
        .with_host(resolved.host);

    if !args.json {
        output::info(&format!(
            "Syncing '{}' with {}/{}...",
            resolved.branch,
            remote.owner.trim(),
            remote.repo.trim()
        ));
    }

    let result = try_sync_repository(
        &ctx,
        &remote.owner,
        &remote.repo,
        resolved.token.as_deref(),
        resolved.mode,
        Some(&resolved.branch),
    );

    if args.json {
        let report = match &result {
            Ok(outcome) => JsonOutput::from_outcome(outcome),
            Err(e) => JsonOutput::from_error(e),
        };
        output::essential(&serde_json::to_string_pretty(&report)?);
    }

    match result {
        Ok(outcome) if outcome.succeeded => {
            if !args.json {
                report_success(&outcome);
            }
            Ok(())
        }
        Ok(outcome) => {
            if let Some(rejection) = outcome.rejection() {
                output::error(&rejection.to_string());
            }
            bail!(failure_message(&audit))
        }
        Err(e) => {
            output::error(&e.to_string());
            bail!(failure_message(&audit))
        }
    }
}

fn report_success(outcome: &SyncOutcome) {
    if outcome.committed {
        output::detail("Committed local changes");
    }
    output::success("Synchronization completed successfully");
}

fn failure_message(audit: &AuditLog) -> String {
    audit.path().map_or_else(
        || "Synchronization failed.".to_string(),
        |path| {
            format!(
                "Synchronization failed. Check {} for details.",
                path.display()
            )
        },
    )
}

/// JSON shape printed by `--json`.
#[derive(Debug, Serialize)]
struct JsonOutput {
    succeeded: bool,
    stage: Option<Stage>,
    committed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pull: Option<CommandOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    push: Option<CommandOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl JsonOutput {
    fn from_outcome(outcome: &SyncOutcome) -> Self {
        Self {
            succeeded: outcome.succeeded,
            stage: Some(outcome.stage),
            committed: outcome.committed,
            pull: outcome.pull.clone(),
            push: outcome.push.clone(),
            error: outcome.rejection().map(|e| e.to_string()),
        }
    }

    fn from_error(error: &upsync_core::Error) -> Self {
        Self {
            succeeded: false,
            stage: error.stage(),
            committed: false,
            pull: None,
            push: None,
            error: Some(error.to_string()),
        }
    }
}
