//! # Prometheus Metrics
//!
//! Operational metrics for the registry node, scraped at `/metrics` on the
//! metrics port.
//!
//! Everything lives in a dedicated [`prometheus::Registry`] prefixed `star`,
//! so the exported names are `star_blocks_appended_total` and so on.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use parking_lot::Mutex;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

use star_registry::registry::RegistryError;

/// Metric handles for the node. Handles are internally reference counted,
/// so clones all feed the same series.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Star blocks successfully appended.
    pub blocks_appended_total: IntCounter,
    /// Rejected submissions, labelled by error reason.
    pub submissions_rejected_total: IntCounterVec,
    /// Current ledger height.
    pub chain_height: IntGauge,
    /// Wall time of accepted submissions, signature check included.
    pub append_latency_seconds: Histogram,
    /// Serializes compare-and-set on `chain_height`.
    height_lock: Arc<Mutex<()>>,
}

impl NodeMetrics {
    /// Create and register all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("star".into()), None)?;

        let blocks_appended_total =
            IntCounter::new("blocks_appended_total", "Star blocks appended to the ledger")?;
        registry.register(Box::new(blocks_appended_total.clone()))?;

        let submissions_rejected_total = IntCounterVec::new(
            Opts::new(
                "submissions_rejected_total",
                "Star submissions rejected, by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(submissions_rejected_total.clone()))?;

        let chain_height = IntGauge::new("chain_height", "Height of the ledger tip")?;
        registry.register(Box::new(chain_height.clone()))?;

        let append_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "append_latency_seconds",
                "Latency of accepted star submissions in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )?;
        registry.register(Box::new(append_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            blocks_appended_total,
            submissions_rejected_total,
            chain_height,
            append_latency_seconds,
            height_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Record an accepted submission whose block landed at `height`.
    pub fn record_append(&self, height: u64, elapsed: Duration) {
        self.blocks_appended_total.inc();
        self.observe_height(height);
        self.append_latency_seconds.observe(elapsed.as_secs_f64());
    }

    /// Raise the height gauge to `height`. Never lowers it, so
    /// out-of-order reports from concurrent submits are harmless.
    pub fn observe_height(&self, height: u64) {
        let _guard = self.height_lock.lock();
        let height = height as i64;
        if height > self.chain_height.get() {
            self.chain_height.set(height);
        }
    }

    /// Record a rejected submission.
    pub fn record_rejection(&self, err: &RegistryError) {
        self.submissions_rejected_total
            .with_label_values(&[err.reason()])
            .inc();
    }

    /// Encode all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics handle for axum state.
pub type SharedMetrics = Arc<NodeMetrics>;

/// `GET /metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
