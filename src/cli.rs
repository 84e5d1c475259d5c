//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::output::OutputContext;

/// One-shot WireGuard VPN endpoints on DigitalOcean
#[derive(Parser)]
#[command(
    name = "vpndrop",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision a VPN endpoint and fetch its client config
    Deploy(commands::DeployArgs),

    /// Delete the recorded droplet and local files
    Destroy(commands::DestroyArgs),

    /// Show the recorded deployment and its live status
    Status,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn run(self) -> Result<()> {
        let Cli {
            no_color,
            quiet,
            command,
        } = self;
        let ctx = OutputContext::new(no_color, quiet);
        match command {
            Command::Deploy(args) => commands::deploy::run(&ctx, &args),
            Command::Destroy(args) => commands::destroy::run(&ctx, &args),
            Command::Status => commands::status::run(&ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_deploy_defaults_match_documented_values() {
        let cli = Cli::try_parse_from(["vpndrop", "deploy"]).unwrap();
        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(args.name, "vpn-server");
        assert_eq!(args.region, "fra1");
        assert_eq!(args.size, "s-1vcpu-1gb");
        assert_eq!(args.image, "ubuntu-22-04-x64");
    }

    #[test]
    fn test_destroy_accepts_yes_short_flag() {
        let cli = Cli::try_parse_from(["vpndrop", "destroy", "-y"]).unwrap();
        let Command::Destroy(args) = cli.command else {
            panic!("expected destroy");
        };
        assert!(args.yes);
    }

    #[test]
    fn test_global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["vpndrop", "status", "--quiet", "--no-color"]).unwrap();
        assert!(cli.quiet);
        assert!(cli.no_color);
    }
}
