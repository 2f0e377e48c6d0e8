//! Prometheus metrics for the P2FK node.
//!
//! All metrics follow the naming convention: `p2fk_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., transactions_processed_total)
//! - **Gauge**: Value that can go up or down (e.g., connected_peers)
//!
//! The registry belongs to the `Metrics` value, so several nodes (or tests)
//! in one process never collide.

use crate::TelemetryError;
use p2fk_04_tx_monitor::{MonitorMetrics, SkipReason};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use shared_types::ItemKind;

fn init_error(e: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsInit(e.to_string())
}

/// Node metrics and the registry that exports them.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // =========================================================================
    // MONITOR
    // =========================================================================
    transactions_processed: IntCounter,
    items_indexed: IntCounterVec,
    transactions_skipped: IntCounterVec,
    content_failures: IntCounter,

    // =========================================================================
    // PEER NETWORK
    // =========================================================================
    connected_peers: IntGauge,
    pending_transactions: IntGauge,
}

impl Metrics {
    /// Create and register every metric.
    ///
    /// # Errors
    ///
    /// A metric that fails validation or registration.
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let transactions_processed = IntCounter::new(
            "p2fk_transactions_processed_total",
            "Transaction ids taken from the feed",
        )
        .map_err(init_error)?;
        let items_indexed = IntCounterVec::new(
            Opts::new("p2fk_items_indexed_total", "Indexed items by kind"),
            &["kind"], // message, file, content-ref
        )
        .map_err(init_error)?;
        let transactions_skipped = IntCounterVec::new(
            Opts::new(
                "p2fk_transactions_skipped_total",
                "Transactions that produced no items",
            ),
            &["reason"],
        )
        .map_err(init_error)?;
        let content_failures = IntCounter::new(
            "p2fk_content_failures_total",
            "Content downloads abandoned after the last retry",
        )
        .map_err(init_error)?;
        let connected_peers =
            IntGauge::new("p2fk_connected_peers", "Currently connected peers").map_err(init_error)?;
        let pending_transactions = IntGauge::new(
            "p2fk_pending_transactions",
            "Transactions held in the mempool cache",
        )
        .map_err(init_error)?;

        registry
            .register(Box::new(transactions_processed.clone()))
            .map_err(init_error)?;
        registry
            .register(Box::new(items_indexed.clone()))
            .map_err(init_error)?;
        registry
            .register(Box::new(transactions_skipped.clone()))
            .map_err(init_error)?;
        registry
            .register(Box::new(content_failures.clone()))
            .map_err(init_error)?;
        registry
            .register(Box::new(connected_peers.clone()))
            .map_err(init_error)?;
        registry
            .register(Box::new(pending_transactions.clone()))
            .map_err(init_error)?;

        Ok(Self {
            registry,
            transactions_processed,
            items_indexed,
            transactions_skipped,
            content_failures,
            connected_peers,
            pending_transactions,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn set_connected_peers(&self, peers: usize) {
        self.connected_peers.set(i64::try_from(peers).unwrap_or(i64::MAX));
    }

    pub fn set_pending_transactions(&self, pending: usize) {
        self.pending_transactions
            .set(i64::try_from(pending).unwrap_or(i64::MAX));
    }

    pub fn transactions_processed(&self) -> u64 {
        self.transactions_processed.get()
    }

    pub fn items_indexed(&self, kind: ItemKind) -> u64 {
        self.items_indexed.with_label_values(&[kind.as_str()]).get()
    }

    /// Encode all metrics as Prometheus text format.
    ///
    /// # Errors
    ///
    /// Encoder failure.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("transactions_processed", &self.transactions_processed.get())
            .field("connected_peers", &self.connected_peers.get())
            .finish()
    }
}

impl MonitorMetrics for Metrics {
    fn transaction_processed(&self) {
        self.transactions_processed.inc();
    }

    fn item_indexed(&self, kind: ItemKind) {
        self.items_indexed.with_label_values(&[kind.as_str()]).inc();
    }

    fn transaction_skipped(&self, reason: SkipReason) {
        self.transactions_skipped
            .with_label_values(&[reason.as_str()])
            .inc();
    }

    fn content_failed(&self) {
        self.content_failures.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_through_port() {
        let metrics = Metrics::new().unwrap();
        let port: &dyn MonitorMetrics = &metrics;
        port.transaction_processed();
        port.transaction_processed();
        port.item_indexed(ItemKind::ContentRef);

        assert_eq!(metrics.transactions_processed(), 2);
        assert_eq!(metrics.items_indexed(ItemKind::ContentRef), 1);
        assert_eq!(metrics.items_indexed(ItemKind::File), 0);
    }

    #[test]
    fn test_registries_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.transaction_processed();
        assert_eq!(b.transactions_processed(), 0);
    }

    #[test]
    fn test_encode_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.transaction_skipped(SkipReason::BlockedSigner);
        metrics.set_connected_peers(3);

        let text = metrics.encode().unwrap();
        assert!(text.contains("p2fk_transactions_skipped_total{reason=\"blocked_signer\"} 1"));
        assert!(text.contains("p2fk_connected_peers 3"));
    }
}
