//! Logging and metrics for the wallet transaction flow
//!
//! # Example
//!
//! ```no_run
//! use wallet_flow_telemetry::{init_tracing, FlowMetrics, TracingSettings};
//!
//! init_tracing(&TracingSettings::default()).unwrap();
//!
//! let metrics = FlowMetrics::new();
//! metrics.record_flow_started();
//! println!("{}", metrics.export().unwrap());
//! ```

pub mod collector;
pub mod metrics;
pub mod tracing;

pub use collector::{FlowMetrics, MetricsError};
pub use tracing::{init_tracing, RunSpan, TracingError, TracingSettings};
