//! `vpndrop destroy [--yes]` — confirmed teardown of the recorded droplet.

use std::path::Path;

use anyhow::Result;

use crate::commands::DestroyArgs;
use crate::credentials;
use crate::error::DeployError;
use crate::output::OutputContext;
use crate::provider::{DigitalOceanApi, DropletApi};
use crate::state::{ARTIFACT_FILE, StateManager};

/// Interactive confirmation seam; tests script the answer.
pub trait ConfirmGate {
    /// Ask the user to confirm. `Ok(false)` means a declined prompt, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin is closed or unreadable.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Production gate reading one line from stdin.
pub struct StdinConfirm;

impl ConfirmGate for StdinConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        use std::io::{BufRead, Write};
        print!("{prompt} [y/N]: ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        let n = std::io::stdin().lock().read_line(&mut line)?;
        anyhow::ensure!(n > 0, "no input provided");
        Ok(line.trim().eq_ignore_ascii_case("y"))
    }
}

/// Run `vpndrop destroy` with production collaborators.
///
/// # Errors
///
/// Returns [`DeployError::NoActiveDeployment`] when there is no record, or
/// [`DeployError::Deletion`] when the provider refuses the delete.
pub fn run(ctx: &OutputContext, args: &DestroyArgs) -> Result<()> {
    let state = StateManager::new();
    // Refuse before asking for credentials when there is nothing to remove.
    if state.load()?.is_none() {
        return Err(DeployError::NoActiveDeployment.into());
    }
    let token = credentials::access_token()?;
    let api = DigitalOceanApi::new(token);
    execute(
        ctx,
        &api,
        &state,
        &StdinConfirm,
        args.yes,
        Path::new(ARTIFACT_FILE),
    )
}

/// Teardown against injected collaborators: load record, confirm, delete
/// the droplet, then purge the record and the local client config.
///
/// # Errors
///
/// Returns [`DeployError::NoActiveDeployment`] when there is no record, or
/// [`DeployError::Deletion`] when the provider refuses the delete.
pub fn execute(
    ctx: &OutputContext,
    api: &impl DropletApi,
    state: &StateManager,
    gate: &impl ConfirmGate,
    assume_yes: bool,
    artifact_path: &Path,
) -> Result<()> {
    let record = state.load()?.ok_or(DeployError::NoActiveDeployment)?;

    ctx.header("Active deployment");
    ctx.kv("name", &record.name);
    ctx.kv("droplet", &record.droplet_id.to_string());
    ctx.kv("address", &record.public_address);
    ctx.kv("region", &record.region);
    ctx.kv("created", &record.created_at.to_rfc3339());
    if !ctx.quiet {
        println!();
    }

    if !assume_yes && !gate.confirm("Delete this droplet?")? {
        // Nothing was touched, but the droplet is still running and billable,
        // so a declined teardown is a non-zero exit.
        anyhow::bail!("cancelled — the droplet is still running");
    }

    api.delete_droplet(record.droplet_id)?;
    state.clear()?;
    if artifact_path.exists() {
        std::fs::remove_file(artifact_path)?;
    }

    ctx.success("Deployment removed");
    Ok(())
}
