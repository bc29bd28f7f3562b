//! Prometheus metrics for the session store.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Sessions created.
pub const SESSIONS_CREATED: &str = "credit_meter_sessions_created_total";

/// Credits consumed.
pub const CREDITS_USED: &str = "credit_meter_credits_used_total";

/// Decrements refused because the balance was zero.
pub const CREDITS_DENIED: &str = "credit_meter_credits_denied_total";

/// Requests that named an unknown or expired session.
pub const SESSIONS_EXPIRED: &str = "credit_meter_sessions_expired_total";

/// Install the global Prometheus recorder and register descriptions.
///
/// Returns `None` if a recorder is already installed (e.g. in tests).
#[must_use]
pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            register_metrics();
            Some(handle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Metrics recorder not installed");
            None
        }
    }
}

fn register_metrics() {
    describe_counter!(SESSIONS_CREATED, "Anonymous sessions created");
    describe_counter!(CREDITS_USED, "Credits consumed by metered actions");
    describe_counter!(CREDITS_DENIED, "Credit requests refused at zero balance");
    describe_counter!(SESSIONS_EXPIRED, "Requests naming an unknown or expired session");
}

pub(crate) fn record_session_created() {
    counter!(SESSIONS_CREATED).increment(1);
}

pub(crate) fn record_credit_used() {
    counter!(CREDITS_USED).increment(1);
}

pub(crate) fn record_credit_denied() {
    counter!(CREDITS_DENIED).increment(1);
}

pub(crate) fn record_session_expired() {
    counter!(SESSIONS_EXPIRED).increment(1);
}
