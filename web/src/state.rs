//! Application state for Axum handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// State shared across all HTTP handlers.
///
/// Generic over the ledger so tests can run the full router against an
/// in-memory ledger with a controllable clock.
pub struct AppState<L> {
    /// Authoritative session store.
    pub ledger: Arc<L>,
    /// Prometheus renderer, present when a recorder was installed.
    pub metrics: Option<PrometheusHandle>,
}

impl<L> AppState<L> {
    /// Create state around `ledger` with metrics rendering disabled.
    #[must_use]
    pub fn new(ledger: L) -> Self {
        Self {
            ledger: Arc::new(ledger),
            metrics: None,
        }
    }

    /// Expose Prometheus metrics at `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

// Manual impl: `L` itself need not be `Clone`.
impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            metrics: self.metrics.clone(),
        }
    }
}
