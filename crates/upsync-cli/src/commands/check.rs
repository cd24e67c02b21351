//! `upsync check` command - Validate inputs and credentials without touching git.

use anyhow::Result;
use upsync_core::{SyncRequest, resolve_endpoint};

use crate::output;

use super::RemoteArgs;

/// Run the check command.
pub fn run(args: &RemoteArgs) -> Result<()> {
    let resolved = args.resolve()?;

    let request = SyncRequest::new(
        &args.owner,
        &args.repo,
        resolved.token.as_deref(),
        resolved.mode,
        Some(&resolved.branch),
    )?;
    output::success(&format!(
        "Inputs valid: {}/{} on '{}' ({} auth)",
        request.owner(),
        request.name(),
        request.branch(),
        request.mode()
    ));

    let endpoint = resolve_endpoint(&request, resolved.key_path.as_deref(), &resolved.host)?;
    output::success("Credentials available");
    output::essential(&endpoint.to_string());

    Ok(())
}
