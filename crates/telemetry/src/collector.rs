use prometheus::{Encoder, TextEncoder};

use wallet_flow_types::{AttemptStatus, FlowOutcome};

use crate::metrics::*;

/// Records flow and monitor activity into the process-wide Prometheus registry
#[derive(Debug, Default)]
pub struct FlowMetrics {
    _private: (),
}

impl FlowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FLOW METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record a run being started
    pub fn record_flow_started(&self) {
        FLOWS_STARTED.inc();
        ACTIVE_FLOWS.inc();
    }

    /// Record the terminal outcome of a run
    pub fn record_flow_outcome(&self, outcome: FlowOutcome) {
        FLOW_OUTCOMES.with_label_values(&[outcome.as_str()]).inc();
        ACTIVE_FLOWS.dec();
    }

    /// Record an attempt reaching a status
    pub fn record_attempt_status(&self, status: AttemptStatus) {
        ATTEMPT_STATUS_COUNT
            .with_label_values(&[status.as_str()])
            .inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MONITOR METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_balance_poll(&self, success: bool) {
        let result = if success { "success" } else { "failure" };
        BALANCE_POLLS.with_label_values(&[result]).inc();
    }

    pub fn record_connect_notification(&self, delivered: bool) {
        let result = if delivered { "delivered" } else { "failed" };
        CONNECT_NOTIFICATIONS.with_label_values(&[result]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPORT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

/// Metrics error types
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_succeeds() {
        let metrics = FlowMetrics::new();
        assert!(metrics.export().is_ok());
    }

    #[test]
    fn test_record_flow_metrics() {
        let metrics = FlowMetrics::new();

        metrics.record_flow_started();
        metrics.record_attempt_status(AttemptStatus::Pending);
        metrics.record_attempt_status(AttemptStatus::Submitted);
        metrics.record_attempt_status(AttemptStatus::Confirmed);
        metrics.record_flow_outcome(FlowOutcome::Completed);

        let exported = metrics.export().unwrap();
        assert!(exported.contains("wallet_flow_flows_started_total"));
        assert!(exported.contains("wallet_flow_flow_outcomes_total"));
        assert!(exported.contains("outcome=\"completed\""));
        assert!(exported.contains("status=\"confirmed\""));
    }

    #[test]
    fn test_record_monitor_metrics() {
        let metrics = FlowMetrics::new();

        metrics.record_balance_poll(true);
        metrics.record_balance_poll(false);
        metrics.record_connect_notification(true);

        let exported = metrics.export().unwrap();
        assert!(exported.contains("wallet_flow_balance_polls_total"));
        assert!(exported.contains("result=\"failure\""));
        assert!(exported.contains("wallet_flow_connect_notifications_total"));
    }

    #[test]
    fn test_outcome_counter_increments() {
        let metrics = FlowMetrics::new();
        let before = FLOW_OUTCOMES.with_label_values(&["cancelled"]).get();

        metrics.record_flow_started();
        metrics.record_flow_outcome(FlowOutcome::Cancelled);

        assert!(FLOW_OUTCOMES.with_label_values(&["cancelled"]).get() > before);
    }
}
