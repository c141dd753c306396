//! # CLI Interface
//!
//! Defines the command-line argument structure for `star-node` using
//! `clap` derive. Supports four subcommands: `run`, `keygen`, `sign`,
//! and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use star_registry::config::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT};

/// Star registry node.
///
/// Serves the registry's HTTP API over a hash-linked ledger and exposes
/// Prometheus metrics. Also doubles as the client-side signing tool.
#[derive(Parser, Debug)]
#[command(
    name = "star-node",
    about = "Star registry node",
    version,
    propagate_version = true
)]
pub struct StarNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the star node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the registry node.
    Run(RunArgs),
    /// Generate an Ed25519 keypair and write the secret to a key file.
    Keygen(KeygenArgs),
    /// Sign a challenge message with a key file and print the signature.
    Sign(SignArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory holding the ledger database. Created on first run.
    #[arg(long, short = 'd', env = "STAR_DATA_DIR", default_value = "star-data")]
    pub data_dir: PathBuf,

    /// Keep the ledger in memory only. Nothing survives a restart.
    #[arg(long, env = "STAR_IN_MEMORY")]
    pub in_memory: bool,

    /// Port for the HTTP API.
    #[arg(long, env = "STAR_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "STAR_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Maximum challenge age in seconds.
    #[arg(long, env = "STAR_CHALLENGE_WINDOW")]
    pub challenge_window: Option<u64>,

    /// Reject challenges dated more than this many seconds in the future.
    #[arg(long, env = "STAR_MAX_CLOCK_SKEW")]
    pub max_clock_skew: Option<u64>,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "STAR_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Where to write the hex-encoded secret key.
    #[arg(long, short = 'o', default_value = "star.key")]
    pub out: PathBuf,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `sign` subcommand.
#[derive(Parser, Debug)]
pub struct SignArgs {
    /// Key file written by `keygen`.
    #[arg(long, short = 'k', env = "STAR_KEY_FILE", default_value = "star.key")]
    pub key: PathBuf,

    /// The challenge message to sign, exactly as issued.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        StarNodeCli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let cli = StarNodeCli::try_parse_from(["star-node", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.api_port, DEFAULT_API_PORT);
        assert_eq!(args.metrics_port, DEFAULT_METRICS_PORT);
        assert!(args.challenge_window.is_none());
        assert!(args.max_clock_skew.is_none());
    }

    #[test]
    fn clock_skew_limit_is_opt_in() {
        let cli =
            StarNodeCli::try_parse_from(["star-node", "run", "--max-clock-skew", "30"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.max_clock_skew, Some(30));
    }

    #[test]
    fn sign_takes_message_positionally() {
        let cli =
            StarNodeCli::try_parse_from(["star-node", "sign", "-k", "a.key", "x:1:starRegistry"])
                .unwrap();
        let Commands::Sign(args) = cli.command else {
            panic!("expected sign");
        };
        assert_eq!(args.key, PathBuf::from("a.key"));
        assert_eq!(args.message, "x:1:starRegistry");
    }
}
