use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use wallet_flow_telemetry::{FlowMetrics, RunSpan};
use wallet_flow_types::{
    AttemptStatus, AttemptTransitionError, ChainClient, FlowOutcome, FlowPlanner,
    OrchestrationRun, StepPayload, TransactionAttempt, WalletConnector,
};

use crate::executor::{ExecutionError, StepExecutor};

/// Configuration for the orchestrator
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Upper bound for each suspended stage. `None` waits indefinitely.
    pub step_timeout: Option<Duration>,

    /// Buffered outcome events per subscriber
    pub event_capacity: usize,
}

impl OrchestratorConfig {
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            step_timeout: None,
            event_capacity: 16,
        }
    }
}

/// Emitted once per run when it reaches its terminal outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeEvent {
    pub run_id: Uuid,
    pub outcome: FlowOutcome,
}

/// Result of `start_flow`
#[derive(Debug)]
pub enum FlowStart {
    /// A new run was created and its step loop spawned
    Started { run_id: Uuid, handle: JoinHandle<()> },

    /// A run is still processing; nothing changed
    AlreadyRunning,
}

impl FlowStart {
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            FlowStart::Started { run_id, .. } => Some(*run_id),
            FlowStart::AlreadyRunning => None,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, FlowStart::Started { .. })
    }

    /// Wait for the step loop of a started run to exit
    pub async fn join(self) {
        if let FlowStart::Started { run_id, handle } = self {
            if let Err(e) = handle.await {
                error!(run_id = %run_id, error = %e, "Flow task aborted");
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("wallet is not connected")]
    NotConnected,
}

/// Builder error
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("missing required field: {field}")]
    MissingField { field: String },
}

/// Builder for FlowOrchestrator
#[derive(Default)]
pub struct FlowOrchestratorBuilder {
    wallet: Option<Arc<dyn WalletConnector>>,
    chain: Option<Arc<dyn ChainClient>>,
    planner: Option<Arc<dyn FlowPlanner>>,
    config: OrchestratorConfig,
    metrics: Option<Arc<FlowMetrics>>,
}

impl FlowOrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wallet connector providing the signer
    pub fn with_wallet(mut self, wallet: Arc<dyn WalletConnector>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Set the chain client used to submit and confirm
    pub fn with_chain(mut self, chain: Arc<dyn ChainClient>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Set the planner producing the steps of each run
    pub fn with_planner(mut self, planner: Arc<dyn FlowPlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<FlowMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the orchestrator, validating that all required fields are set
    pub fn build(self) -> Result<FlowOrchestrator, BuilderError> {
        let wallet = self.wallet.ok_or_else(|| BuilderError::MissingField {
            field: "wallet".to_string(),
        })?;

        let chain = self.chain.ok_or_else(|| BuilderError::MissingField {
            field: "chain".to_string(),
        })?;

        let planner = self.planner.ok_or_else(|| BuilderError::MissingField {
            field: "planner".to_string(),
        })?;

        let executor = StepExecutor::new(
            Arc::clone(&wallet),
            chain,
            planner,
            self.config.step_timeout,
        );
        let (events, _) = broadcast::channel(self.config.event_capacity.max(1));

        Ok(FlowOrchestrator {
            inner: Arc::new(Inner {
                wallet,
                executor,
                run: RwLock::new(None),
                events,
                metrics: self.metrics,
            }),
        })
    }
}

/// Drives one flow at a time from start to a single terminal outcome.
///
/// State is readable at any point through [`FlowOrchestrator::snapshot`];
/// terminal outcomes are published to receivers from [`FlowOrchestrator::subscribe`].
#[derive(Clone)]
pub struct FlowOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    wallet: Arc<dyn WalletConnector>,
    executor: StepExecutor,
    run: RwLock<Option<OrchestrationRun>>,
    events: broadcast::Sender<OutcomeEvent>,
    metrics: Option<Arc<FlowMetrics>>,
}

enum StepOutcome {
    Confirmed,
    Halted(ExecutionError),
    /// The run was cancelled while the step was suspended
    Abandoned,
}

impl FlowOrchestrator {
    pub fn builder() -> FlowOrchestratorBuilder {
        FlowOrchestratorBuilder::new()
    }

    /// Start a new run for the connected wallet.
    ///
    /// Returns as soon as the step loop is spawned. Calling this while a run is
    /// processing is a no-op.
    pub async fn start_flow(&self) -> Result<FlowStart, OrchestratorError> {
        if !self.inner.wallet.is_connected() {
            warn!("Flow start requested without a connected wallet");
            return Err(OrchestratorError::NotConnected);
        }
        let owner = self
            .inner
            .wallet
            .account_address()
            .ok_or(OrchestratorError::NotConnected)?;

        let run_id = {
            let mut slot = self.inner.run.write().await;
            if slot.as_ref().is_some_and(|run| run.is_processing) {
                debug!("Flow already processing, ignoring start request");
                return Ok(FlowStart::AlreadyRunning);
            }
            let run = OrchestrationRun::new();
            let run_id = run.run_id;
            *slot = Some(run);
            run_id
        };

        info!(run_id = %run_id, owner = %owner, "Starting flow");
        if let Some(metrics) = &self.inner.metrics {
            metrics.record_flow_started();
        }

        let span = RunSpan::new(run_id, &owner).span();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(inner.drive(run_id, owner).instrument(span));

        Ok(FlowStart::Started { run_id, handle })
    }

    /// Cancel the processing run. Steps already on chain stay as they are;
    /// no further attempt is started. Returns false when nothing was processing.
    pub async fn cancel_flow(&self) -> bool {
        let cancelled = {
            let mut slot = self.inner.run.write().await;
            match slot.as_mut() {
                Some(run) if run.is_processing => {
                    run.finish(FlowOutcome::Cancelled);
                    Some(run.run_id)
                }
                _ => None,
            }
        };

        match cancelled {
            Some(run_id) => {
                info!(run_id = %run_id, "Flow cancelled by caller");
                self.inner.announce(run_id, FlowOutcome::Cancelled);
                true
            }
            None => {
                debug!("Cancel requested with no processing flow");
                false
            }
        }
    }

    /// Copy of the current (or most recent) run
    pub async fn snapshot(&self) -> Option<OrchestrationRun> {
        self.inner.run.read().await.clone()
    }

    pub async fn is_processing(&self) -> bool {
        self.inner
            .run
            .read()
            .await
            .as_ref()
            .is_some_and(|run| run.is_processing)
    }

    pub async fn outcome(&self) -> Option<FlowOutcome> {
        self.inner
            .run
            .read()
            .await
            .as_ref()
            .and_then(|run| run.outcome)
    }

    /// Receive terminal outcomes of subsequent runs
    pub fn subscribe(&self) -> broadcast::Receiver<OutcomeEvent> {
        self.inner.events.subscribe()
    }
}

impl Inner {
    /// Step loop of a single run
    async fn drive(self: Arc<Self>, run_id: Uuid, owner: String) {
        let plan = match self.executor.plan(&owner).await {
            Ok(plan) => plan,
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Flow planning failed");
                self.finish(run_id, e.outcome()).await;
                return;
            }
        };

        info!(run_id = %run_id, steps = plan.len(), "Flow planned");

        for payload in &plan {
            let Some(index) = self.begin_attempt(run_id).await else {
                info!(run_id = %run_id, "Run no longer processing, not starting further attempts");
                return;
            };

            match self.execute_step(run_id, index, payload).await {
                StepOutcome::Confirmed => {}
                StepOutcome::Halted(e) => {
                    self.finish(run_id, e.outcome()).await;
                    return;
                }
                StepOutcome::Abandoned => return,
            }
        }

        self.finish(run_id, FlowOutcome::Completed).await;
    }

    async fn execute_step(&self, run_id: Uuid, index: usize, payload: &StepPayload) -> StepOutcome {
        debug!(
            run_id = %run_id,
            sequence_index = index,
            label = %payload.label,
            "Requesting signature"
        );

        let signed = match self.executor.sign(payload).await {
            Ok(signed) => signed,
            Err(e) => {
                warn!(
                    run_id = %run_id,
                    sequence_index = index,
                    stage = %e.stage(),
                    error = %e,
                    "Signature not obtained"
                );
                self.fail_attempt(run_id, index, &e).await;
                return StepOutcome::Halted(e);
            }
        };

        if !self.is_active(run_id).await {
            info!(
                run_id = %run_id,
                sequence_index = index,
                "Discarding signature received after cancellation"
            );
            return StepOutcome::Abandoned;
        }

        let handle = match self.executor.submit(&signed).await {
            Ok(handle) => handle,
            Err(e) => {
                error!(run_id = %run_id, sequence_index = index, error = %e, "Submission failed");
                self.fail_attempt(run_id, index, &e).await;
                return StepOutcome::Halted(e);
            }
        };

        let submitted = handle.clone();
        self.transition(run_id, index, move |attempt| attempt.mark_submitted(submitted))
            .await;
        info!(run_id = %run_id, sequence_index = index, handle = %handle, "Transaction submitted");

        // Once on chain the step is tracked to the end, even if the run was cancelled meanwhile.
        match self.executor.confirm(&handle).await {
            Ok(confirmation) => {
                let usd_value = confirmation.usd_value;
                self.transition(run_id, index, move |attempt| attempt.mark_confirmed(usd_value))
                    .await;
                info!(
                    run_id = %run_id,
                    sequence_index = index,
                    usd_value = %usd_value,
                    "Transaction confirmed"
                );
                StepOutcome::Confirmed
            }
            Err(e) => {
                error!(
                    run_id = %run_id,
                    sequence_index = index,
                    handle = %handle,
                    error = %e,
                    "Confirmation failed"
                );
                self.fail_attempt(run_id, index, &e).await;
                StepOutcome::Halted(e)
            }
        }
    }

    /// Mutate the run only if it is still the one identified by `run_id`
    async fn update_run<R>(
        &self,
        run_id: Uuid,
        f: impl FnOnce(&mut OrchestrationRun) -> R,
    ) -> Option<R> {
        let mut slot = self.run.write().await;
        match slot.as_mut() {
            Some(run) if run.run_id == run_id => Some(f(run)),
            _ => None,
        }
    }

    async fn is_active(&self, run_id: Uuid) -> bool {
        self.run
            .read()
            .await
            .as_ref()
            .is_some_and(|run| run.run_id == run_id && run.is_processing)
    }

    async fn begin_attempt(&self, run_id: Uuid) -> Option<usize> {
        let index = self
            .update_run(run_id, |run| run.is_processing.then(|| run.begin_attempt()))
            .await
            .flatten()?;

        debug!(run_id = %run_id, sequence_index = index, "Attempt appended");
        if let Some(metrics) = &self.metrics {
            metrics.record_attempt_status(AttemptStatus::Pending);
        }
        Some(index)
    }

    async fn transition(
        &self,
        run_id: Uuid,
        index: usize,
        f: impl FnOnce(&mut TransactionAttempt) -> Result<(), AttemptTransitionError>,
    ) {
        let result = self
            .update_run(run_id, |run| {
                run.attempt_mut(index)
                    .map(|attempt| f(attempt).map(|()| attempt.status))
            })
            .await
            .flatten();

        match result {
            Some(Ok(status)) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_attempt_status(status);
                }
            }
            Some(Err(e)) => warn!(run_id = %run_id, error = %e, "Ignoring attempt transition"),
            None => warn!(
                run_id = %run_id,
                sequence_index = index,
                "Attempt no longer tracked, dropping update"
            ),
        }
    }

    async fn fail_attempt(&self, run_id: Uuid, index: usize, error: &ExecutionError) {
        let reason = error.to_string();
        self.transition(run_id, index, move |attempt| attempt.mark_failed(reason))
            .await;
    }

    async fn finish(&self, run_id: Uuid, outcome: FlowOutcome) {
        let finished = self
            .update_run(run_id, |run| run.finish(outcome))
            .await
            .unwrap_or(false);

        if finished {
            self.announce(run_id, outcome);
        } else {
            debug!(
                run_id = %run_id,
                outcome = %outcome,
                "Run already has an outcome, keeping it"
            );
        }
    }

    fn announce(&self, run_id: Uuid, outcome: FlowOutcome) {
        info!(run_id = %run_id, outcome = %outcome, "Flow finished");

        if let Some(metrics) = &self.metrics {
            metrics.record_flow_outcome(outcome);
        }

        if self.events.send(OutcomeEvent { run_id, outcome }).is_err() {
            debug!(run_id = %run_id, "No outcome subscribers");
        }
    }
}
