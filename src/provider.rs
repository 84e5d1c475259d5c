//! DigitalOcean droplet API client.
//!
//! All calls are blocking and sequential. The `DropletApi` trait is the seam
//! commands are written against; tests substitute scripted in-memory
//! implementations.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::DeployError;

const API_BASE: &str = "https://api.digitalocean.com/v2";

/// Per-request ceiling; individual connects are bounded separately by ureq.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A registered account SSH key, as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct SshKey {
    pub id: u64,
    pub public_key: String,
}

/// One IPv4 assignment on a droplet.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkV4 {
    pub ip_address: String,
    /// `"public"` or `"private"`.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Networks {
    #[serde(default)]
    pub v4: Vec<NetworkV4>,
}

/// Provider-owned droplet view. Never mutated locally; refreshed by re-GET.
#[derive(Debug, Clone, Deserialize)]
pub struct Droplet {
    pub id: u64,
    pub status: String,
    #[serde(default)]
    pub networks: Networks,
}

impl Droplet {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    /// The public IPv4 address, if one has been assigned yet.
    #[must_use]
    pub fn public_v4(&self) -> Option<&str> {
        self.networks
            .v4
            .iter()
            .find(|net| net.kind == "public")
            .map(|net| net.ip_address.as_str())
    }
}

/// Creation parameters. Immutable once submitted.
#[derive(Debug, Clone)]
pub struct DropletRequest<'a> {
    pub name: &'a str,
    pub region: &'a str,
    pub size: &'a str,
    pub image: &'a str,
    pub ssh_key_id: u64,
    /// Cloud-init payload, passed through as an opaque blob.
    pub user_data: &'a str,
}

/// Blocking droplet operations.
pub trait DropletApi {
    /// List the account's registered SSH keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    fn list_keys(&self) -> Result<Vec<SshKey>>;

    /// Register a public key under `name`, returning the new key id.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::KeyRegistration`] if the provider rejects the key.
    fn register_key(&self, name: &str, public_key: &str) -> Result<u64>;

    /// Submit a droplet for creation, returning its id. Creation is
    /// asynchronous on the provider side; the droplet is not usable until
    /// its status reaches `active`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InstanceCreation`] if the provider rejects the
    /// request.
    fn create_droplet(&self, request: &DropletRequest<'_>) -> Result<u64>;

    /// Fetch the current view of a droplet.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    fn get_droplet(&self, id: u64) -> Result<Droplet>;

    /// Delete a droplet.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Deletion`] on any non-success response.
    fn delete_droplet(&self, id: u64) -> Result<()>;
}

/// Production client, bearer-authenticated against the v2 API.
pub struct DigitalOceanApi {
    agent: ureq::Agent,
    token: String,
    base: String,
}

#[derive(Deserialize)]
struct KeyListEnvelope {
    ssh_keys: Vec<SshKey>,
}

#[derive(Deserialize)]
struct KeyEnvelope {
    ssh_key: SshKey,
}

#[derive(Deserialize)]
struct DropletEnvelope {
    droplet: Droplet,
}

impl DigitalOceanApi {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self::with_base(token, API_BASE.to_string())
    }

    /// Client pointed at an alternate API base (for mock servers).
    #[must_use]
    pub fn with_base(token: String, base: String) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self { agent, token, base }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }
}

/// Best-effort extraction of the provider's error body for diagnostics.
fn response_body(response: ureq::Response) -> String {
    response
        .into_string()
        .unwrap_or_else(|_| "<unreadable response body>".to_string())
}

impl DropletApi for DigitalOceanApi {
    fn list_keys(&self) -> Result<Vec<SshKey>> {
        let response = self
            .agent
            .get(&self.url("/account/keys"))
            .set("Authorization", &self.auth_header())
            .call()
            .context("listing account SSH keys")?;
        let envelope: KeyListEnvelope = response
            .into_json()
            .context("parsing SSH key listing")?;
        Ok(envelope.ssh_keys)
    }

    fn register_key(&self, name: &str, public_key: &str) -> Result<u64> {
        let result = self
            .agent
            .post(&self.url("/account/keys"))
            .set("Authorization", &self.auth_header())
            .send_json(serde_json::json!({
                "name": name,
                "public_key": public_key,
            }));
        match result {
            Ok(response) => {
                let envelope: KeyEnvelope = response
                    .into_json()
                    .context("parsing SSH key registration response")?;
                Ok(envelope.ssh_key.id)
            }
            Err(ureq::Error::Status(code, response)) => Err(DeployError::KeyRegistration(
                format!("HTTP {code}: {}", response_body(response)),
            )
            .into()),
            Err(e) => Err(DeployError::KeyRegistration(e.to_string()).into()),
        }
    }

    fn create_droplet(&self, request: &DropletRequest<'_>) -> Result<u64> {
        let result = self
            .agent
            .post(&self.url("/droplets"))
            .set("Authorization", &self.auth_header())
            .send_json(serde_json::json!({
                "name": request.name,
                "region": request.region,
                "size": request.size,
                "image": request.image,
                "ssh_keys": [request.ssh_key_id],
                "user_data": request.user_data,
            }));
        match result {
            Ok(response) => {
                let envelope: DropletEnvelope = response
                    .into_json()
                    .context("parsing droplet creation response")?;
                Ok(envelope.droplet.id)
            }
            Err(ureq::Error::Status(code, response)) => Err(DeployError::InstanceCreation(
                format!("HTTP {code}: {}", response_body(response)),
            )
            .into()),
            Err(e) => Err(DeployError::InstanceCreation(e.to_string()).into()),
        }
    }

    fn get_droplet(&self, id: u64) -> Result<Droplet> {
        let response = self
            .agent
            .get(&self.url(&format!("/droplets/{id}")))
            .set("Authorization", &self.auth_header())
            .call()
            .with_context(|| format!("fetching droplet {id}"))?;
        let envelope: DropletEnvelope = response
            .into_json()
            .context("parsing droplet response")?;
        Ok(envelope.droplet)
    }

    fn delete_droplet(&self, id: u64) -> Result<()> {
        let result = self
            .agent
            .delete(&self.url(&format!("/droplets/{id}")))
            .set("Authorization", &self.auth_header())
            .call();
        match result {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, response)) => Err(DeployError::Deletion(format!(
                "HTTP {code}: {}",
                response_body(response)
            ))
            .into()),
            Err(e) => Err(DeployError::Deletion(e.to_string()).into()),
        }
    }
}
