//! Typed deployment errors.
//!
//! Every failure mode of the pipeline has one variant here. All variants are
//! terminal for the current run: commands propagate them through
//! `anyhow::Result` with `?` and `main` exits non-zero. Callers that need to
//! branch on a specific condition downcast with
//! `err.downcast_ref::<DeployError>()`.

use thiserror::Error;

/// Errors raised by the provisioning pipeline and teardown path.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(
        "No DigitalOcean access token.\n\nSet DIGITALOCEAN_ACCESS_TOKEN or run from a terminal to be prompted."
    )]
    MissingCredential,

    #[error("SSH key registration failed: {0}")]
    KeyRegistration(String),

    #[error("Droplet creation failed: {0}")]
    InstanceCreation(String),

    #[error("Timed out waiting for the droplet to become active.")]
    ProvisioningTimeout,

    #[error("Timed out waiting for SSH to become reachable.")]
    SshUnreachable,

    #[error(
        "Timed out waiting for the bootstrap to complete.\n\n\
         Droplet {droplet_id} is still running (and billable). Check it over SSH,\n\
         or delete it from the DigitalOcean console."
    )]
    BootstrapTimeout { droplet_id: u64 },

    #[error("Could not fetch the client configuration: {0}")]
    ArtifactFetch(String),

    #[error("Droplet deletion failed: {0}")]
    Deletion(String),

    #[error("No active deployment. Run 'vpndrop deploy' to create one.")]
    NoActiveDeployment,
}
