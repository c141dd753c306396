// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Star Registry Node
//!
//! Entry point for the `star-node` binary. Parses CLI arguments, initializes
//! logging and metrics, opens the ledger, and serves the HTTP API.
//!
//! The binary supports four subcommands:
//!
//! - `run`     — start the registry node
//! - `keygen`  — generate an owner keypair
//! - `sign`    — sign a challenge with a key file
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;

use star_registry::config::RegistryConfig;
use star_registry::crypto::{sign_message, StarKeypair};
use star_registry::registry::StarRegistry;
use star_registry::storage::LedgerDb;

use cli::{Commands, StarNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = StarNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Keygen(args) => keygen(args),
        Commands::Sign(args) => sign(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: ledger, API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(logging::RUN_FILTER, LogFormat::from_str_lossy(&args.log_format));

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        in_memory = args.in_memory,
        data_dir = %args.data_dir.display(),
        "starting star-node"
    );

    let mut config = RegistryConfig::default();
    if let Some(window) = args.challenge_window {
        config.challenge_window_secs = window;
    }
    config.max_clock_skew_secs = args.max_clock_skew;

    // --- Ledger ---
    let registry = if args.in_memory {
        StarRegistry::in_memory(config).context("failed to initialize in-memory ledger")?
    } else {
        let db_path = args.data_dir.join("ledger");
        std::fs::create_dir_all(&db_path).with_context(|| {
            format!("failed to create database directory: {}", db_path.display())
        })?;
        let db = LedgerDb::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;
        tracing::info!(path = %db_path.display(), "database opened");
        StarRegistry::open(db, config).context("failed to load ledger")?
    };
    let registry = Arc::new(registry);

    let report = registry.validate_chain();
    if !report.is_valid() {
        tracing::warn!(
            violations = report.violations().len(),
            "ledger failed validation at startup; serving anyway"
        );
    }

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);
    node_metrics.observe_height(registry.chain_height());

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            star_registry::config::PROTOCOL_VERSION,
        ),
        registry: Arc::clone(&registry),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!(height = registry.chain_height(), "star-node stopped");
    Ok(())
}

/// Generates an owner keypair and writes the secret key file.
fn keygen(args: cli::KeygenArgs) -> Result<()> {
    logging::init_logging(logging::TOOL_FILTER, LogFormat::Pretty);

    if args.out.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite",
            args.out.display()
        );
    }

    let keypair = StarKeypair::generate();
    write_secret(&args.out, &keypair.secret_key_hex())
        .with_context(|| format!("failed to write key to {}", args.out.display()))?;

    println!("Key written to : {}", args.out.display());
    println!("Address        : {}", keypair.address());
    Ok(())
}

/// Writes `secret` to a fresh file at `path`, owner-only on Unix.
///
/// An existing file is removed first so the new one is created with the
/// restricted mode instead of inheriting the old permissions.
fn write_secret(path: &Path, secret: &str) -> std::io::Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(secret.as_bytes())?;
    file.sync_all()
}

/// Signs a challenge message with a key file and prints the hex signature.
fn sign(args: cli::SignArgs) -> Result<()> {
    logging::init_logging(logging::TOOL_FILTER, LogFormat::Pretty);

    let secret = std::fs::read_to_string(&args.key)
        .with_context(|| format!("failed to read key file {}", args.key.display()))?;
    let keypair = StarKeypair::from_hex(&secret)
        .with_context(|| format!("invalid key in {}", args.key.display()))?;

    println!("{}", sign_message(&keypair, &args.message));
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("star-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", star_registry::config::PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// If a handler cannot be installed, that branch never fires and the other
/// one still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
