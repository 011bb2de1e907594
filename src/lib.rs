//! Wallet-driven transaction flow
//!
//! Wires the [`FlowOrchestrator`], the [`OutcomeBridge`] and the [`BalanceMonitor`]
//! together from an [`AppConfig`]. The wallet, chain client, planner and notifiers
//! are supplied by the host through [`Collaborators`].

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub use wallet_flow_config::{self as config, validate_config, AppConfig, ConfigLoader};
pub use wallet_flow_monitor::{
    self as monitor, BalanceMonitor, ConnectionTransport, LogTransport, MonitorConfig,
    MonitorHandle,
};
pub use wallet_flow_orchestrator::{
    self as orchestrator, FlowOrchestrator, FlowStart, OrchestratorConfig, OutcomeBridge,
    OutcomeEvent,
};
pub use wallet_flow_telemetry::{self as telemetry, FlowMetrics, TracingSettings};
pub use wallet_flow_types as types;

use wallet_flow_types::{ChainClient, FlowPlanner, OutcomeNotifier, WalletConnector};

/// External systems the flow talks to
#[derive(Clone)]
pub struct Collaborators {
    pub wallet: Arc<dyn WalletConnector>,
    pub chain: Arc<dyn ChainClient>,
    pub planner: Arc<dyn FlowPlanner>,
    pub notifier: Arc<dyn OutcomeNotifier>,
    pub transport: Arc<dyn ConnectionTransport>,
}

/// Install the global tracing subscriber described by the `network` section
pub fn init_logging(config: &AppConfig) -> Result<()> {
    wallet_flow_telemetry::init_tracing(&TracingSettings {
        level: config.network.log_level.clone(),
        json: config.network.json_logs,
    })
    .context("failed to initialize tracing")
}

/// The assembled flow: orchestrator, outcome bridge and balance monitor
pub struct App {
    config: AppConfig,
    wallet: Arc<dyn WalletConnector>,
    notifier: Arc<dyn OutcomeNotifier>,
    orchestrator: FlowOrchestrator,
    monitor: BalanceMonitor,
    metrics: Option<Arc<FlowMetrics>>,
    bridge_task: Option<JoinHandle<()>>,
    monitor_handle: Option<MonitorHandle>,
}

impl App {
    /// Validate `config` and build every component. Nothing is spawned until [`App::start`].
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Result<Self> {
        validate_config(&config).context("invalid configuration")?;

        let metrics = config
            .network
            .metrics_enabled
            .then(|| Arc::new(FlowMetrics::new()));

        let mut orchestrator_config = OrchestratorConfig {
            event_capacity: config.flow.event_capacity,
            ..Default::default()
        };
        if let Some(timeout) = config.flow.step_timeout() {
            orchestrator_config = orchestrator_config.with_step_timeout(timeout);
        }

        let mut builder = FlowOrchestrator::builder()
            .with_wallet(Arc::clone(&collaborators.wallet))
            .with_chain(Arc::clone(&collaborators.chain))
            .with_planner(collaborators.planner)
            .with_config(orchestrator_config);
        if let Some(metrics) = &metrics {
            builder = builder.with_metrics(Arc::clone(metrics));
        }
        let orchestrator = builder.build().context("failed to build orchestrator")?;

        let mut monitor = BalanceMonitor::new(
            collaborators.chain,
            collaborators.transport,
            MonitorConfig {
                poll_interval: config.monitor.poll_interval(),
                min_eligible_balance: config.monitor.min_eligible_balance,
                connect_notifications: config.notifications.connect_event_enabled,
            },
        );
        if let Some(metrics) = &metrics {
            monitor = monitor.with_metrics(Arc::clone(metrics));
        }

        Ok(Self {
            config,
            wallet: collaborators.wallet,
            notifier: collaborators.notifier,
            orchestrator,
            monitor,
            metrics,
            bridge_task: None,
            monitor_handle: None,
        })
    }

    /// Load configuration from `path` with `WALLET_FLOW_*` overrides, then build
    pub fn from_file(path: &Path, collaborators: Collaborators) -> Result<Self> {
        let config = ConfigLoader::from_file_with_env(path, wallet_flow_config::ENV_PREFIX)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        Self::new(config, collaborators)
    }

    /// Spawn the outcome bridge and the balance monitor. Calling it again is a no-op.
    pub fn start(&mut self) {
        if self.bridge_task.is_none() && self.config.notifications.feedback_enabled {
            let bridge = OutcomeBridge::new(Arc::clone(&self.wallet), Arc::clone(&self.notifier));
            self.bridge_task = Some(bridge.spawn(self.orchestrator.subscribe()));
        }

        if self.monitor_handle.is_none() {
            self.monitor_handle = Some(self.monitor.spawn(self.wallet.connection_events()));
        }

        info!(
            environment = ?self.config.network.environment,
            feedback = self.config.notifications.feedback_enabled,
            connect_event = self.config.notifications.connect_event_enabled,
            "Wallet flow started"
        );
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &FlowOrchestrator {
        &self.orchestrator
    }

    pub fn monitor(&self) -> &BalanceMonitor {
        &self.monitor
    }

    /// Prometheus text exposition, or `None` when metrics are disabled
    pub fn export_metrics(&self) -> Result<Option<String>> {
        match &self.metrics {
            Some(metrics) => Ok(Some(metrics.export().context("failed to encode metrics")?)),
            None => Ok(None),
        }
    }

    /// Stop background tasks. A run in progress keeps going until it reaches its outcome.
    pub fn shutdown(mut self) {
        if let Some(handle) = self.monitor_handle.take() {
            handle.stop();
        }
        if let Some(task) = self.bridge_task.take() {
            task.abort();
        }
        info!("Wallet flow stopped");
    }
}
