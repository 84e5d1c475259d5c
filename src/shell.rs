//! Remote command execution over SSH.

use std::path::PathBuf;
use std::process::{Command, Output};

use anyhow::{Context, Result};

/// All remote commands run as root; the image has no other account.
pub const SSH_USER: &str = "root";

/// Blocking remote command execution. Commands are written against this
/// trait; tests substitute scripted in-memory shells.
pub trait RemoteShell {
    /// Run `command` on the host at `address`, returning the full process
    /// output. A non-zero remote exit is reported through `Output::status`,
    /// not as an `Err`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local `ssh` process cannot be spawned.
    fn run(&self, address: &str, command: &str) -> Result<Output>;
}

/// Production shell, spawning the system `ssh` with key auth.
///
/// Host key checking is disabled. That is trust-on-first-use, and it is
/// acceptable here only because this process created the host moments ago;
/// there is no prior key to verify against.
pub struct Ssh {
    identity: PathBuf,
}

impl Ssh {
    #[must_use]
    pub fn new(identity: PathBuf) -> Self {
        Self { identity }
    }
}

impl RemoteShell for Ssh {
    fn run(&self, address: &str, command: &str) -> Result<Output> {
        Command::new("ssh")
            .arg("-i")
            .arg(&self.identity)
            .args([
                "-o",
                "StrictHostKeyChecking=no",
                "-o",
                "UserKnownHostsFile=/dev/null",
                "-o",
                "ConnectTimeout=5",
                "-o",
                "BatchMode=yes",
            ])
            .arg(format!("{SSH_USER}@{address}"))
            .arg(command)
            .output()
            .context("running ssh (is OpenSSH installed?)")
    }
}
