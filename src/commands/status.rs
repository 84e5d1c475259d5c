//! `vpndrop status` — show the recorded deployment and its live state.

use anyhow::Result;

use crate::credentials;
use crate::error::DeployError;
use crate::output::OutputContext;
use crate::provider::{DigitalOceanApi, DropletApi};
use crate::state::{DeploymentRecord, StateManager};

/// Run `vpndrop status` with production collaborators.
///
/// # Errors
///
/// Returns [`DeployError::NoActiveDeployment`] when there is no record.
pub fn run(ctx: &OutputContext) -> Result<()> {
    let record = StateManager::new()
        .load()?
        .ok_or(DeployError::NoActiveDeployment)?;
    let token = credentials::access_token()?;
    let api = DigitalOceanApi::new(token);
    execute(ctx, &api, &record)
}

/// Print the record plus one live status fetch. Read-only: never mutates
/// local or remote state.
///
/// # Errors
///
/// Returns an error only if printing fails upstream; a failed status fetch
/// degrades to a warning.
pub fn execute(ctx: &OutputContext, api: &impl DropletApi, record: &DeploymentRecord) -> Result<()> {
    ctx.header("Deployment");
    ctx.kv("name", &record.name);
    ctx.kv("droplet", &record.droplet_id.to_string());
    ctx.kv("address", &record.public_address);
    ctx.kv("region", &record.region);
    ctx.kv("size", &record.size);
    ctx.kv("created", &record.created_at.to_rfc3339());

    match api.get_droplet(record.droplet_id) {
        Ok(droplet) => ctx.kv("status", &droplet.status),
        Err(_) => ctx.warn(
            "Droplet not found at the provider; it may have been deleted out-of-band. \
             Run 'vpndrop destroy' to clean up the local record.",
        ),
    }
    Ok(())
}
