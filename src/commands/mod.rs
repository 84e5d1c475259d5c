//! Command implementations.

pub mod deploy;
pub mod destroy;
pub mod status;

use clap::Args;

/// Arguments for `vpndrop deploy`.
#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Droplet name
    #[arg(long, default_value = "vpn-server")]
    pub name: String,

    /// DigitalOcean region slug
    #[arg(long, default_value = "fra1")]
    pub region: String,

    /// Droplet size slug
    #[arg(long, default_value = "s-1vcpu-1gb")]
    pub size: String,

    /// Base image slug
    #[arg(long, default_value = "ubuntu-22-04-x64")]
    pub image: String,
}

/// Arguments for `vpndrop destroy`.
#[derive(Debug, Args)]
pub struct DestroyArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}
