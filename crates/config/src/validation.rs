//! Configuration validation

use crate::{AppConfig, ConfigError, Result};
use rust_decimal::Decimal;

/// Shortest poll interval accepted for the balance monitor
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Network
    if let Err(e) = validate_log_level(&config.network.log_level) {
        errors.push(e);
    }

    // Flow
    if config.flow.step_timeout_ms == Some(0) {
        errors.push(ValidationError::new(
            "flow.step_timeout_ms",
            "must be greater than 0 when set",
        ));
    }

    if config.flow.event_capacity == 0 {
        errors.push(ValidationError::new(
            "flow.event_capacity",
            "must be greater than 0",
        ));
    }

    // Monitor
    if config.monitor.poll_interval_ms < MIN_POLL_INTERVAL_MS {
        errors.push(ValidationError::new(
            "monitor.poll_interval_ms",
            format!("must be at least {MIN_POLL_INTERVAL_MS}"),
        ));
    }

    if config.monitor.min_eligible_balance < Decimal::ZERO {
        errors.push(ValidationError::new(
            "monitor.min_eligible_balance",
            "must not be negative",
        ));
    }

    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// Validate log level string
pub fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "network.log_level",
            format!("invalid log level '{level}', must be one of: trace, debug, info, warn, error"),
        )),
    }
}
