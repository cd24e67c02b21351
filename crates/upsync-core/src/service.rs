//! Caller entry point: validate, resolve credentials, synchronize.

use std::path::PathBuf;

use upsync_git::GitRunner;

use crate::audit::AuditLog;
use crate::auth::{DEFAULT_HOST, default_key_path, resolve_endpoint};
use crate::error::Result;
use crate::request::{AuthMode, SyncRequest};
use crate::sync::{Orchestrator, SyncOutcome};

/// Collaborators and environment of one sync invocation.
pub struct SyncContext<'a, G: GitRunner> {
    git: &'a G,
    audit: &'a AuditLog,
    key_path: Option<PathBuf>,
    host: String,
}

impl<'a, G: GitRunner> SyncContext<'a, G> {
    /// Context with the default key path (`~/.ssh/id_rsa`) and host.
    #[must_use]
    pub fn new(git: &'a G, audit: &'a AuditLog) -> Self {
        Self {
            git,
            audit,
            key_path: default_key_path(),
            host: DEFAULT_HOST.to_string(),
        }
    }

    /// Check a different key artifact in key mode.
    #[must_use]
    pub fn with_key_path(mut self, key_path: Option<PathBuf>) -> Self {
        self.key_path = key_path;
        self
    }

    /// Sync against a host other than `github.com`.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }
}

/// Synchronize the working copy and report only whether it worked.
///
/// Details of any failure are in the audit log. `branch` defaults to `main`.
pub fn sync_repository<G: GitRunner>(
    ctx: &SyncContext<'_, G>,
    owner: &str,
    name: &str,
    secret: Option<&str>,
    mode: AuthMode,
    branch: Option<&str>,
) -> bool {
    try_sync_repository(ctx, owner, name, secret, mode, branch).is_ok_and(|o| o.succeeded)
}

/// Synchronize the working copy, returning the full outcome.
///
/// A rejected pull or push is still `Ok`; check [`SyncOutcome::succeeded`].
/// The final verdict is always recorded in the audit log.
///
/// # Errors
/// Returns the validation, authentication or precondition error that
/// stopped the run.
pub fn try_sync_repository<G: GitRunner>(
    ctx: &SyncContext<'_, G>,
    owner: &str,
    name: &str,
    secret: Option<&str>,
    mode: AuthMode,
    branch: Option<&str>,
) -> Result<SyncOutcome> {
    let audit = ctx.audit;
    let result = run(ctx, owner, name, secret, mode, branch);

    match &result {
        Ok(outcome) if outcome.succeeded => audit.info("sync finished: success"),
        Ok(_) => audit.error("sync finished: rejected, see pull/push stderr above"),
        Err(e) => audit.error(format!("sync aborted: {e}")),
    }

    result
}

fn run<G: GitRunner>(
    ctx: &SyncContext<'_, G>,
    owner: &str,
    name: &str,
    secret: Option<&str>,
    mode: AuthMode,
    branch: Option<&str>,
) -> Result<SyncOutcome> {
    let audit = ctx.audit;
    audit.info(format!(
        "sync requested for {}/{} ({mode} auth)",
        owner.trim(),
        name.trim()
    ));

    let request = SyncRequest::new(owner, name, secret, mode, branch)
        .inspect_err(|e| audit.error(format!("validation failed: {e}")))?;
    if mode == AuthMode::Key && secret.is_some_and(|s| !s.trim().is_empty()) {
        audit.warn("token supplied in key mode is ignored");
    }

    let endpoint = resolve_endpoint(&request, ctx.key_path.as_deref(), &ctx.host)
        .inspect_err(|e| audit.error(e.to_string()))?;
    audit.info(format!(
        "remote endpoint {endpoint}, branch '{}'",
        request.branch()
    ));

    Orchestrator::new(ctx.git, audit).run(&endpoint, request.branch())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::sync::Stage;
    use crate::test_mocks::MockGit;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_end_to_end_token_dirty_tree() {
        let git = MockGit::new().with_dirty_tree();
        let (audit, memory) = AuditLog::in_memory();
        let ctx = SyncContext::new(&git, &audit);

        assert!(sync_repository(
            &ctx,
            "octocat",
            "hello",
            Some("ghp_token"),
            AuthMode::Token,
            None
        ));
        assert_eq!(git.count("commit"), 1);

        // The first record tagged with each stage appears in stage order.
        let lines = memory.lines();
        let positions: Vec<usize> = Stage::ALL
            .iter()
            .map(|stage| {
                let tag = format!("[{stage}]");
                lines
                    .iter()
                    .position(|l| l.contains(&tag))
                    .unwrap_or_else(|| panic!("no record for {stage}"))
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");

        assert!(lines.last().unwrap().ends_with("INFO - sync finished: success"));
        assert!(!memory.contents().contains("ghp_token"));
    }

    #[test]
    fn test_validation_failure_makes_no_git_calls() {
        let git = MockGit::new();
        let (audit, memory) = AuditLog::in_memory();
        let ctx = SyncContext::new(&git, &audit);

        let err = try_sync_repository(&ctx, "", "x", Some("y"), AuthMode::Token, None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(git.calls().is_empty());
        assert!(memory.contents().contains("owner missing"));
    }

    #[test]
    fn test_missing_token_fails() {
        let git = MockGit::new();
        let (audit, memory) = AuditLog::in_memory();
        let ctx = SyncContext::new(&git, &audit);

        assert!(!sync_repository(&ctx, "x", "y", None, AuthMode::Token, None));
        assert!(git.calls().is_empty());
        assert!(memory.contents().contains("token required"));
    }

    #[test]
    fn test_key_mode_without_artifact() {
        let temp = TempDir::new().unwrap();
        let git = MockGit::new();
        let (audit, memory) = AuditLog::in_memory();
        let ctx = SyncContext::new(&git, &audit).with_key_path(Some(temp.path().join("id_rsa")));

        let err = try_sync_repository(&ctx, "x", "y", None, AuthMode::Key, None).unwrap_err();
        assert!(matches!(err, Error::AuthenticationUnavailable(_)));
        assert!(git.calls().is_empty());
        assert!(memory.contents().contains("key artifact not found"));
    }

    #[test]
    fn test_key_mode_with_artifact_and_host() {
        let temp = TempDir::new().unwrap();
        let key = temp.path().join("id_ed25519");
        fs::write(&key, "key").unwrap();

        let git = MockGit::new();
        let (audit, _memory) = AuditLog::in_memory();
        let ctx = SyncContext::new(&git, &audit)
            .with_key_path(Some(key))
            .with_host("git.example.com");

        let outcome =
            try_sync_repository(&ctx, "x", "y", None, AuthMode::Key, Some("release")).unwrap();
        assert!(outcome.succeeded);
        assert_eq!(
            git.calls_for("push")[0],
            ["push", "git@git.example.com:x/y.git", "release"]
        );
    }

    #[test]
    fn test_rejected_sync_is_false_and_logged() {
        let git = MockGit::new().with_failure("push", "remote: Permission denied");
        let (audit, memory) = AuditLog::in_memory();
        let ctx = SyncContext::new(&git, &audit);

        assert!(!sync_repository(&ctx, "x", "y", Some("t0ken"), AuthMode::Token, None));
        let log = memory.contents();
        assert!(log.contains("Permission denied"));
        assert!(log.contains("ERROR - sync finished: rejected"));
    }

    #[test]
    fn test_unclassified_failure_is_false() {
        let git = MockGit::new().with_spawn_failure("config");
        let (audit, memory) = AuditLog::in_memory();
        let ctx = SyncContext::new(&git, &audit);

        assert!(!sync_repository(&ctx, "x", "y", Some("t0ken"), AuthMode::Token, None));
        assert!(memory.contents().contains("sync aborted: git error"));
    }

    #[test]
    fn test_repeated_sync_on_clean_tree_never_commits() {
        let git = MockGit::new();
        let (audit, _memory) = AuditLog::in_memory();
        let ctx = SyncContext::new(&git, &audit);

        for _ in 0..3 {
            assert!(sync_repository(&ctx, "x", "y", Some("t0ken"), AuthMode::Token, None));
        }
        assert_eq!(git.count("commit"), 0);
        assert_eq!(git.count("push"), 3);
    }

    #[test]
    fn test_token_in_key_mode_warns() {
        let temp = TempDir::new().unwrap();
        let key = temp.path().join("id_rsa");
        fs::write(&key, "key").unwrap();
        let git = MockGit::new();
        let (audit, memory) = AuditLog::in_memory();
        let ctx = SyncContext::new(&git, &audit).with_key_path(Some(key));

        assert!(sync_repository(&ctx, "x", "y", Some("ghp_unused"), AuthMode::Key, None));

        let log = memory.contents();
        assert!(log.contains("WARNING - token supplied in key mode is ignored"));
        assert!(!log.contains("ghp_unused"));
        assert!(git.calls_for("fetch")[0][1].starts_with("git@github.com:"));
    }
}
