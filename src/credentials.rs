//! Access-token acquisition.
//!
//! The token is held in memory for the lifetime of the command and is never
//! logged or written to disk.

use anyhow::Result;
use console::Term;
use dialoguer::Password;

use crate::error::DeployError;

/// Environment variable consulted before prompting.
pub const TOKEN_ENV: &str = "DIGITALOCEAN_ACCESS_TOKEN";

/// Resolve the DigitalOcean access token: environment first, then a masked
/// interactive prompt when attached to a terminal.
///
/// # Errors
///
/// Returns [`DeployError::MissingCredential`] when neither source yields a
/// non-empty token.
pub fn access_token() -> Result<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }
    if !Term::stderr().is_term() {
        return Err(DeployError::MissingCredential.into());
    }
    let token = Password::new()
        .with_prompt("DigitalOcean access token")
        .allow_empty_password(true)
        .interact()
        .map_err(|_| DeployError::MissingCredential)?;
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(DeployError::MissingCredential.into());
    }
    Ok(token)
}
