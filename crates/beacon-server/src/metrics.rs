//! Prometheus recorder and metric names.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder.
///
/// Call once at startup, before any metric is recorded. The returned handle
/// renders the `/metrics` body.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Sessions accepted (counter).
pub const SESSIONS_ACCEPTED_TOTAL: &str = "beacon_sessions_accepted_total";
/// Sessions removed from the registry (counter).
pub const SESSIONS_DISCONNECTED_TOTAL: &str = "beacon_sessions_disconnected_total";
/// Registered sessions (gauge).
pub const SESSIONS_ACTIVE: &str = "beacon_sessions_active";
/// Upgrades refused at the connection limit (counter).
pub const UPGRADES_REJECTED_TOTAL: &str = "beacon_upgrades_rejected_total";
/// Envelopes placed on outbound queues (counter, labels: kind).
pub const ENVELOPES_ENQUEUED_TOTAL: &str = "beacon_envelopes_enqueued_total";
/// Outbound frames dropped on a full session queue (counter).
pub const OUTBOUND_DROPPED_TOTAL: &str = "beacon_outbound_dropped_total";
/// Sessions disconnected because their outbound queue filled (counter).
pub const SLOW_PEERS_EVICTED_TOTAL: &str = "beacon_slow_peers_evicted_total";
/// Inbound frames that were not valid coordinate reports (counter).
pub const MALFORMED_REPORTS_TOTAL: &str = "beacon_malformed_reports_total";
/// Outbound writes that failed (counter).
pub const WRITE_FAILURES_TOTAL: &str = "beacon_write_failures_total";
/// Session lifetime from accept to termination (histogram, seconds).
pub const SESSION_DURATION_SECONDS: &str = "beacon_session_duration_seconds";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_recorder_renders() {
        // Local recorder only; the global one can be installed once per process.
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!(SESSIONS_ACCEPTED_TOTAL).increment(2);
        });
        assert!(handle.render().contains("beacon_sessions_accepted_total 2"));
    }

    #[test]
    fn names_are_prefixed_snake_case() {
        let names = [
            SESSIONS_ACCEPTED_TOTAL,
            SESSIONS_DISCONNECTED_TOTAL,
            SESSIONS_ACTIVE,
            UPGRADES_REJECTED_TOTAL,
            ENVELOPES_ENQUEUED_TOTAL,
            OUTBOUND_DROPPED_TOTAL,
            SLOW_PEERS_EVICTED_TOTAL,
            MALFORMED_REPORTS_TOTAL,
            WRITE_FAILURES_TOTAL,
            SESSION_DURATION_SECONDS,
        ];
        for name in names {
            assert!(name.starts_with("beacon_"), "{name}");
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "{name}"
            );
        }
    }
}
