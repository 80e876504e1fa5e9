//! Prometheus metrics collection for Lorekeeper
//!
//! Tracks:
//! - Requests by handler and outcome
//! - Upstream LLM call latency and failures by provider
//! - Store lookups that failed and were degraded to empty data
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::store::Table;

/// Request handler label
///
/// Keeps label cardinality fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    UniverseChat,
    LoreAssistant,
}

impl Handler {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handler::UniverseChat => "universe_chat",
            Handler::LoreAssistant => "lore_assistant",
        }
    }
}

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    requests_total: IntCounterVec,
    upstream_duration: HistogramVec,
    upstream_failures: IntCounterVec,
    store_lookup_failures: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // outcome is "success" or an AppError::kind() label
        let requests_total = IntCounterVec::new(
            Opts::new(
                "lorekeeper_requests_total",
                "Total number of chat requests by handler and outcome",
            ),
            &["handler", "outcome"],
        )?;

        let upstream_duration = HistogramVec::new(
            HistogramOpts::new(
                "lorekeeper_upstream_duration_ms",
                "Chat completion latency in milliseconds by provider",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0,
            ]),
            &["provider"],
        )?;

        let upstream_failures = IntCounterVec::new(
            Opts::new(
                "lorekeeper_upstream_failures_total",
                "Total number of failed chat completion calls by provider",
            ),
            &["provider"],
        )?;

        let store_lookup_failures = IntCounterVec::new(
            Opts::new(
                "lorekeeper_store_lookup_failures_total",
                "Store lookups that failed and were replaced with empty data, by table",
            ),
            &["table"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(upstream_duration.clone()))?;
        registry.register(Box::new(upstream_failures.clone()))?;
        registry.register(Box::new(store_lookup_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            upstream_duration,
            upstream_failures,
            store_lookup_failures,
        })
    }

    pub fn record_request(&self, handler: Handler, outcome: &str) {
        self.requests_total
            .with_label_values(&[handler.as_str(), outcome])
            .inc();
    }

    pub fn record_upstream_duration(&self, provider: &str, duration_ms: f64) {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            tracing::warn!(
                provider = %provider,
                duration_ms,
                "Ignoring invalid upstream duration sample"
            );
            return;
        }
        self.upstream_duration
            .with_label_values(&[provider])
            .observe(duration_ms);
    }

    pub fn record_upstream_failure(&self, provider: &str) {
        self.upstream_failures.with_label_values(&[provider]).inc();
    }

    pub fn record_store_lookup_failure(&self, table: Table) {
        self.store_lookup_failures
            .with_label_values(&[table.as_str()])
            .inc();
    }

    /// Current request count for a handler/outcome pair
    pub fn requests_count(&self, handler: Handler, outcome: &str) -> u64 {
        self.requests_total
            .with_label_values(&[handler.as_str(), outcome])
            .get()
    }

    /// Current failure count for a table
    pub fn store_lookup_failures_count(&self, table: Table) -> u64 {
        self.store_lookup_failures
            .with_label_values(&[table.as_str()])
            .get()
    }

    /// Encode all registered metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();

        encoder.encode(&metric_families, &mut buffer).map_err(|e| {
            tracing::error!(
                error = %e,
                metric_family_count = metric_families.len(),
                "Prometheus text encoder failed"
            );
            e
        })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}",
                e.utf8_error().valid_up_to(),
                e
            ))
        })
    }
}
