//! Client SSH key management.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, bail};

use crate::error::DeployError;
use crate::provider::DropletApi;

/// Key file base name under `~/.ssh`.
const KEY_NAME: &str = "vpndrop_ed25519";

/// Name used when registering the key with the provider.
const REGISTERED_KEY_NAME: &str = "vpndrop";

/// An ed25519 key pair on disk.
///
/// Generated with an empty passphrase: the key exists solely to let this
/// unattended process reach a droplet it just created, and it never leaves
/// the local `~/.ssh` directory.
pub struct KeyPair {
    pub private_path: PathBuf,
    pub public_path: PathBuf,
}

impl KeyPair {
    /// Key pair at the default location, `~/.ssh/vpndrop_ed25519`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_location() -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
        Ok(Self::at(home.join(".ssh"), KEY_NAME))
    }

    /// Key pair rooted at an explicit directory (used in tests).
    #[must_use]
    pub fn at(dir: PathBuf, name: &str) -> Self {
        let private_path = dir.join(name);
        let public_path = dir.join(format!("{name}.pub"));
        Self {
            private_path,
            public_path,
        }
    }

    /// Generate the key pair if it does not exist yet. Reuses an existing
    /// pair untouched, so repeated deploys keep one local identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the key directory cannot be created or
    /// `ssh-keygen` fails.
    pub fn ensure(&self) -> Result<()> {
        if self.private_path.exists() && self.public_path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.private_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let output = Command::new("ssh-keygen")
            .args(["-t", "ed25519", "-N", "", "-C", REGISTERED_KEY_NAME, "-f"])
            .arg(&self.private_path)
            .output()
            .context("running ssh-keygen (is OpenSSH installed?)")?;
        if !output.status.success() {
            bail!(
                "ssh-keygen failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    /// Read the public key material, trimmed of trailing whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the public key file cannot be read.
    pub fn public_key(&self) -> Result<String> {
        let content = std::fs::read_to_string(&self.public_path)
            .with_context(|| format!("reading public key {}", self.public_path.display()))?;
        Ok(content.trim().to_string())
    }
}

/// Ensure `public_key` is registered with the provider, returning its key id.
///
/// Checks the account listing first so re-deploys never accumulate duplicate
/// keys; registration only happens for genuinely new material.
///
/// # Errors
///
/// Returns [`DeployError::KeyRegistration`] if the listing or registration
/// fails.
pub fn ensure_registered(api: &impl DropletApi, public_key: &str) -> Result<u64> {
    let existing = api
        .list_keys()
        .map_err(|e| DeployError::KeyRegistration(format!("{e:#}")))?;
    if let Some(key) = existing.iter().find(|k| key_material_matches(&k.public_key, public_key)) {
        return Ok(key.id);
    }
    api.register_key(REGISTERED_KEY_NAME, public_key)
}

/// Compare keys on `type base64` only; comments differ between the local
/// file and what the provider echoes back.
fn key_material_matches(a: &str, b: &str) -> bool {
    let material = |key: &str| -> Option<(String, String)> {
        let mut parts = key.split_whitespace();
        Some((parts.next()?.to_string(), parts.next()?.to_string()))
    };
    match (material(a), material(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
