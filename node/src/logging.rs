//! # Structured Logging
//!
//! Sets up the global `tracing` subscriber for the node: an `EnvFilter`
//! (`RUST_LOG` wins over the built-in default) plus either a pretty or a
//! JSON-lines formatter.
//!
//! Output goes to stderr. stdout is reserved for command results such as
//! the hex signature printed by `star-node sign`, so it can be piped.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for the `run` subcommand.
pub const RUN_FILTER: &str = "star_node=info,star_registry=info,tower_http=info";

/// Default filter for one-shot subcommands (`keygen`, `sign`).
pub const TOOL_FILTER: &str = "star_node=warn,star_registry=warn";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored output for local runs.
    Pretty,
    /// One JSON object per line, for log shippers.
    Json,
}

impl LogFormat {
    /// `"json"` (any case) selects JSON; everything else is `Pretty`.
    pub fn from_str_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Install the global subscriber. Call once, early in `main()`.
///
/// `default_level` is any `EnvFilter` directive string and only applies
/// when `RUST_LOG` is unset, e.g.:
///
/// ```text
/// RUST_LOG=star_registry=debug,tower_http=debug star-node run
/// ```
pub fn init_logging(default_level: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .init(),
    }

    tracing::debug!(?format, "logging initialized");
}
