//! vpndrop - one-shot WireGuard VPN endpoints on DigitalOcean

use clap::Parser;

use vpndrop::cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
