//! Embedded bootstrap payload and its remote contract.
//!
//! The script is opaque to the orchestrator: it rides along as cloud-init
//! user data, and the only coupling is the two paths below.

/// Cloud-init script that installs and configures WireGuard on the droplet.
pub const BOOTSTRAP_SCRIPT: &str = include_str!("../assets/bootstrap.sh");

/// File the script touches last; its existence means the bootstrap finished.
pub const SENTINEL_PATH: &str = "/root/setup_complete";

/// Where the script leaves the generated client configuration.
pub const CLIENT_CONFIG_PATH: &str = "/root/client.conf";
