//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Infinder - fetch deferred resources with caller-driven, bounded retry
#[derive(Parser, Debug)]
#[command(name = "infinder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress status output and logs below ERROR; errors are still shown
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to an infinder.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Load a resource from a URL or file, retrying on failure
    Fetch(FetchArgs),
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Config commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show(ConfigShowArgs),

    /// Print the path of the user config file
    Path,
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

// Fetch command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// URL (http:// or https://) or file path to load
    pub source: String,

    /// Named resource whose configured policy applies
    #[arg(short, long)]
    pub resource: Option<String>,

    /// Override the retry budget (0 = single attempt)
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Override the delay before a retry, in milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Ask before each retry instead of retrying automatically
    #[arg(short, long)]
    pub interactive: bool,

    /// Print the final loader state as JSON instead of the resource body
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch_with_overrides() {
        let cli = Cli::try_parse_from([
            "infinder",
            "-vv",
            "fetch",
            "https://api.infinder.io/brands",
            "--max-retries",
            "0",
            "--retry-delay-ms",
            "250",
            "--resource",
            "brands",
            "-i",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch command");
        };
        assert_eq!(args.source, "https://api.infinder.io/brands");
        assert_eq!(args.max_retries, Some(0));
        assert_eq!(args.retry_delay_ms, Some(250));
        assert_eq!(args.resource.as_deref(), Some("brands"));
        assert!(args.interactive);
        assert!(!args.json);
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["infinder", "config", "show", "--json", "-c", "custom.yaml"])
                .unwrap();
        assert_eq!(cli.config, Some(Utf8PathBuf::from("custom.yaml")));
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommands::Show(ConfigShowArgs { json: true }))
        ));
    }

    #[test]
    fn test_fetch_requires_source() {
        assert!(Cli::try_parse_from(["infinder", "fetch"]).is_err());
    }
}
