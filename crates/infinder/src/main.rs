//! Infinder CLI - load deferred resources with bounded, caller-driven retry
//!
//! This is the main entry point for the Infinder command-line interface.

mod cli;
mod commands;
mod output;
mod version;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any TLS client is built
    infinder::install_crypto_provider();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);
    output::set_quiet(cli.quiet);

    match cli.command {
        Commands::Version(args) => commands::version::run(args),
        Commands::Config(args) => commands::config::run(args, cli.config.as_deref()),
        Commands::Fetch(args) => commands::fetch::run(args, cli.config.as_deref()).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Failed attempts are logged at WARN; keep them visible by default
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
