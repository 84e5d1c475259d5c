//! Local deployment record persistence.
//!
//! The record is the sole source of truth for what `destroy` is allowed to
//! delete. It is written once, after the full pipeline has succeeded, and
//! removed after a successful teardown.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record file name, resolved against the working directory.
pub const RECORD_FILE: &str = "deployment.json";

/// Client configuration written next to the record after a deploy.
pub const ARTIFACT_FILE: &str = "wg0.conf";

/// Everything needed to identify and tear down one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub droplet_id: u64,
    pub public_address: String,
    pub name: String,
    pub region: String,
    pub size: String,
    pub created_at: DateTime<Utc>,
}

/// Record file manager.
pub struct StateManager {
    path: PathBuf,
}

impl StateManager {
    /// Create a state manager using the default path (`./deployment.json`).
    #[must_use]
    pub fn new() -> Self {
        Self::with_path(PathBuf::from(RECORD_FILE))
    }

    /// Create a state manager with an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the existing record, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<DeploymentRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading record file {}", self.path.display()))?;
        let record: DeploymentRecord = serde_json::from_str(&content)
            .with_context(|| format!("parsing record file {}", self.path.display()))?;
        Ok(Some(record))
    }

    /// Save the record to disk with mode 600.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot
    /// be written.
    pub fn save(&self, record: &DeploymentRecord) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(record).context("serializing record")?;
        std::fs::write(&self.path, &content)
            .with_context(|| format!("writing record file {}", self.path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Remove the record file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("removing record file {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
