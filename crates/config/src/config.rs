//! Configuration structures

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Environment and logging
    #[serde(default)]
    pub network: NetworkConfig,

    /// Transaction orchestrator settings
    #[serde(default)]
    pub flow: FlowConfig,

    /// Balance monitor settings
    #[serde(default)]
    pub monitor: MonitorSettings,

    /// Outbound notification switches
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Network environment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment type (mainnet, devnet, local)
    #[serde(default)]
    pub environment: Environment,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Enable metrics collection
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

/// Environment types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Devnet,
    #[default]
    Local,
}

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Upper bound on each signer or chain wait; unset waits indefinitely
    #[serde(default)]
    pub step_timeout_ms: Option<u64>,

    /// Buffered outcome events per subscriber
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl FlowConfig {
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_ms.map(Duration::from_millis)
    }
}

/// Balance monitor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Poll interval while the wallet is connected
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Minimum SOL balance that counts as eligible
    #[serde(default = "default_min_eligible_balance")]
    pub min_eligible_balance: Decimal,
}

impl MonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Notification configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Send the one-time `wallet_connected` event
    #[serde(default = "default_true")]
    pub connect_event_enabled: bool,

    /// Open the feedback prompt on cancelled or failed runs
    #[serde(default = "default_true")]
    pub feedback_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_event_capacity() -> usize {
    16
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_min_eligible_balance() -> Decimal {
    Decimal::new(1, 5) // 0.00001 SOL
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_level: default_log_level(),
            json_logs: false,
            metrics_enabled: default_true(),
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            min_eligible_balance: default_min_eligible_balance(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            connect_event_enabled: default_true(),
            feedback_enabled: default_true(),
        }
    }
}
