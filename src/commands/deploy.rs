//! `vpndrop deploy` — provision a WireGuard endpoint end to end.
//!
//! The pipeline is strictly sequential: register key, create droplet, wait
//! for active, wait for SSH, wait for the bootstrap sentinel, fetch the
//! client config, and only then persist the local record. Any failure
//! aborts the run where it stands; a droplet created before the failure is
//! left for out-of-band cleanup and the record is never written.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::assets;
use crate::commands::DeployArgs;
use crate::credentials;
use crate::error::DeployError;
use crate::keys::{self, KeyPair};
use crate::output::{OutputContext, progress};
use crate::provider::{DigitalOceanApi, DropletApi, DropletRequest};
use crate::readiness::{self, Sleeper, ThreadSleeper};
use crate::shell::{RemoteShell, Ssh};
use crate::state::{ARTIFACT_FILE, DeploymentRecord, StateManager};

/// Everything the pipeline touches, bundled so tests can substitute each
/// collaborator independently.
pub struct Pipeline<'a, A, S, T> {
    pub api: &'a A,
    pub shell: &'a S,
    pub sleeper: &'a T,
    pub state: &'a StateManager,
    pub artifact_path: &'a Path,
}

/// Run `vpndrop deploy` with production collaborators.
///
/// # Errors
///
/// Returns an error if any pipeline stage fails; see [`DeployError`] for the
/// taxonomy.
pub fn run(ctx: &OutputContext, args: &DeployArgs) -> Result<()> {
    let token = credentials::access_token()?;
    let api = DigitalOceanApi::new(token);
    let key_pair = KeyPair::default_location()?;
    key_pair.ensure()?;
    let public_key = key_pair.public_key()?;
    let shell = Ssh::new(key_pair.private_path.clone());
    let state = StateManager::new();
    let pipeline = Pipeline {
        api: &api,
        shell: &shell,
        sleeper: &ThreadSleeper,
        state: &state,
        artifact_path: Path::new(ARTIFACT_FILE),
    };
    execute(ctx, &pipeline, &public_key, args)
}

/// Drive the full pipeline against injected collaborators.
///
/// # Errors
///
/// Returns an error if any pipeline stage fails.
pub fn execute<A: DropletApi, S: RemoteShell, T: Sleeper>(
    ctx: &OutputContext,
    pipeline: &Pipeline<'_, A, S, T>,
    public_key: &str,
    args: &DeployArgs,
) -> Result<()> {
    ctx.header("Deploying WireGuard endpoint");

    let key_id = keys::ensure_registered(pipeline.api, public_key)?;
    ctx.success(&format!("SSH key registered (id {key_id})"));

    let request = DropletRequest {
        name: &args.name,
        region: &args.region,
        size: &args.size,
        image: &args.image,
        ssh_key_id: key_id,
        user_data: assets::BOOTSTRAP_SCRIPT,
    };
    let droplet_id = pipeline.api.create_droplet(&request)?;
    ctx.success(&format!("Droplet {droplet_id} created in {}", args.region));

    let address = with_spinner(
        ctx,
        "Waiting for the droplet to become active",
        "Droplet active",
        || readiness::wait_for_active(pipeline.api, pipeline.sleeper, droplet_id),
    )?;

    with_spinner(ctx, "Waiting for SSH to come up", "SSH reachable", || {
        readiness::wait_for_ssh(pipeline.shell, pipeline.sleeper, &address)
    })?;

    with_spinner(
        ctx,
        "Waiting for the WireGuard bootstrap",
        "Bootstrap complete",
        || readiness::wait_for_bootstrap(pipeline.shell, pipeline.sleeper, &address, droplet_id),
    )?;

    let config = fetch_client_config(pipeline.shell, &address)?;
    std::fs::write(pipeline.artifact_path, config)
        .with_context(|| format!("writing {}", pipeline.artifact_path.display()))?;

    pipeline.state.save(&DeploymentRecord {
        droplet_id,
        public_address: address.clone(),
        name: args.name.clone(),
        region: args.region.clone(),
        size: args.size.clone(),
        created_at: Utc::now(),
    })?;

    if !ctx.quiet {
        println!();
    }
    ctx.success(&format!("VPN endpoint ready at {address}"));
    ctx.kv("client config", &pipeline.artifact_path.display().to_string());
    ctx.kv("teardown", "vpndrop destroy");
    Ok(())
}

/// Run a long phase behind a spinner when attached to a terminal.
fn with_spinner<V>(
    ctx: &OutputContext,
    msg: &str,
    done: &str,
    phase: impl FnOnce() -> Result<V>,
) -> Result<V> {
    if !ctx.show_progress() {
        let value = phase()?;
        ctx.success(done);
        return Ok(value);
    }
    let pb = progress::spinner(msg);
    match phase() {
        Ok(value) => {
            progress::finish_ok(&pb, done);
            Ok(value)
        }
        Err(e) => {
            pb.finish_and_clear();
            Err(e)
        }
    }
}

/// Read the generated client configuration off the host, verbatim.
fn fetch_client_config(shell: &impl RemoteShell, address: &str) -> Result<String> {
    let output = shell.run(address, &format!("cat {}", assets::CLIENT_CONFIG_PATH))?;
    if !output.status.success() {
        return Err(DeployError::ArtifactFetch(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        )
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::cell::Cell;
    use std::os::unix::process::ExitStatusExt;
    use std::process::{ExitStatus, Output};

    use anyhow::{Result, anyhow};
    use tempfile::TempDir;

    use super::*;
    use crate::provider::{Droplet, SshKey};
    use crate::readiness::test_helpers::InstantSleeper;

    const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIKq1 vpndrop";

    fn quiet_ctx() -> OutputContext {
        OutputContext::new(true, true)
    }

    fn args() -> DeployArgs {
        DeployArgs {
            name: "vpn-server".to_string(),
            region: "fra1".to_string(),
            size: "s-1vcpu-1gb".to_string(),
            image: "ubuntu-22-04-x64".to_string(),
        }
    }

    /// Provider that never activates the droplet.
    struct StuckApi {
        gets: Cell<u32>,
    }

    impl DropletApi for StuckApi {
        fn list_keys(&self) -> Result<Vec<SshKey>> {
            Ok(vec![SshKey {
                id: 7,
                public_key: PUBLIC_KEY.to_string(),
            }])
        }

        fn register_key(&self, _name: &str, _public_key: &str) -> Result<u64> {
            Err(anyhow!("should have matched the existing key"))
        }

        fn create_droplet(&self, _request: &DropletRequest<'_>) -> Result<u64> {
            Ok(42)
        }

        fn get_droplet(&self, _id: u64) -> Result<Droplet> {
            self.gets.set(self.gets.get() + 1);
            Ok(serde_json::from_str(r#"{"id": 42, "status": "new"}"#).unwrap())
        }

        fn delete_droplet(&self, _id: u64) -> Result<()> {
            unreachable!("deploy never deletes")
        }
    }

    /// Shell that records every invocation.
    struct CountingShell {
        runs: Cell<u32>,
    }

    impl RemoteShell for CountingShell {
        fn run(&self, _address: &str, _command: &str) -> Result<Output> {
            self.runs.set(self.runs.get() + 1);
            Ok(Output {
                status: ExitStatus::from_raw(0),
                stdout: Vec::new(),
                stderr: Vec::new(),
            })
        }
    }

    #[test]
    fn test_provisioning_timeout_never_probes_ssh_or_writes_state() {
        let dir = TempDir::new().unwrap();
        let api = StuckApi { gets: Cell::new(0) };
        let shell = CountingShell { runs: Cell::new(0) };
        let state = StateManager::with_path(dir.path().join("deployment.json"));
        let artifact = dir.path().join("wg0.conf");
        let pipeline = Pipeline {
            api: &api,
            shell: &shell,
            sleeper: &InstantSleeper::default(),
            state: &state,
            artifact_path: &artifact,
        };

        let err = execute(&quiet_ctx(), &pipeline, PUBLIC_KEY, &args()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::ProvisioningTimeout)
        ));
        assert_eq!(shell.runs.get(), 0, "SSH phase must not run after timeout");
        assert!(state.load().unwrap().is_none(), "no record on failure");
        assert!(!artifact.exists(), "no artifact on failure");
    }

    #[test]
    fn test_artifact_fetch_failure_surfaces_stderr() {
        struct FailingCat;
        impl RemoteShell for FailingCat {
            fn run(&self, _address: &str, command: &str) -> Result<Output> {
                if command.starts_with("cat ") {
                    Ok(Output {
                        status: ExitStatus::from_raw(1 << 8),
                        stdout: Vec::new(),
                        stderr: b"cat: /root/client.conf: No such file or directory\n".to_vec(),
                    })
                } else {
                    Ok(Output {
                        status: ExitStatus::from_raw(0),
                        stdout: Vec::new(),
                        stderr: Vec::new(),
                    })
                }
            }
        }

        let err = fetch_client_config(&FailingCat, "203.0.113.5").unwrap_err();
        match err.downcast_ref::<DeployError>() {
            Some(DeployError::ArtifactFetch(detail)) => {
                assert!(detail.contains("No such file"));
            }
            other => panic!("expected ArtifactFetch, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_returns_config_verbatim() {
        struct ConfigShell;
        impl RemoteShell for ConfigShell {
            fn run(&self, _address: &str, _command: &str) -> Result<Output> {
                Ok(Output {
                    status: ExitStatus::from_raw(0),
                    stdout: b"[Interface]\nPrivateKey = x\n".to_vec(),
                    stderr: Vec::new(),
                })
            }
        }

        let config = fetch_client_config(&ConfigShell, "203.0.113.5").unwrap();
        assert_eq!(config, "[Interface]\nPrivateKey = x\n");
    }
}
