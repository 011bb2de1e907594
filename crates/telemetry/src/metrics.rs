use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

lazy_static! {
    // ═══════════════════════════════════════════════════════════════════════════
    // FLOW METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Total number of flows started
    pub static ref FLOWS_STARTED: IntCounter = register_int_counter!(
        "wallet_flow_flows_started_total",
        "Total number of flows started"
    )
    .unwrap();

    /// Flows by terminal outcome
    pub static ref FLOW_OUTCOMES: IntCounterVec = register_int_counter_vec!(
        "wallet_flow_flow_outcomes_total",
        "Flows by terminal outcome",
        &["outcome"]
    )
    .unwrap();

    /// Flows currently processing
    pub static ref ACTIVE_FLOWS: IntGauge = register_int_gauge!(
        "wallet_flow_active_flows",
        "Number of flows currently processing"
    )
    .unwrap();

    /// Attempt status transitions
    pub static ref ATTEMPT_STATUS_COUNT: IntCounterVec = register_int_counter_vec!(
        "wallet_flow_attempt_status_total",
        "Transaction attempts by status reached",
        &["status"]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // MONITOR METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Balance polls by result
    pub static ref BALANCE_POLLS: IntCounterVec = register_int_counter_vec!(
        "wallet_flow_balance_polls_total",
        "Balance polls by result",
        &["result"]
    )
    .unwrap();

    /// Connection notifications by delivery result
    pub static ref CONNECT_NOTIFICATIONS: IntCounterVec = register_int_counter_vec!(
        "wallet_flow_connect_notifications_total",
        "Connection notifications by delivery result",
        &["result"]
    )
    .unwrap();
}
