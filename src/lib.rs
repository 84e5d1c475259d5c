//! One-shot WireGuard VPN endpoint deployment on DigitalOcean.
//!
//! The library exposes the full pipeline behind trait seams (`DropletApi`,
//! `RemoteShell`, `Sleeper`, `ConfirmGate`) so integration tests can drive
//! it without a cloud account; the `vpndrop` binary wires in the production
//! implementations.

pub mod assets;
pub mod cli;
pub mod commands;
pub mod credentials;
pub mod error;
pub mod keys;
pub mod output;
pub mod provider;
pub mod readiness;
pub mod shell;
pub mod state;
