use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use wallet_flow_types::{
    ChainClient, Confirmation, FlowOutcome, FlowPlanner, SignedTransaction, SignerError,
    StepPayload, TxHandle, WalletConnector,
};

/// Stage of a flow at which work is suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStage {
    Planning,
    Signing,
    Submitting,
    Confirming,
}

impl ExecutionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStage::Planning => "planning",
            ExecutionStage::Signing => "signing",
            ExecutionStage::Submitting => "submitting",
            ExecutionStage::Confirming => "confirming",
        }
    }
}

impl fmt::Display for ExecutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step execution errors
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("signature rejected: {0}")]
    Rejected(#[from] SignerError),

    #[error("planning failed: {reason}")]
    Planning { reason: String },

    #[error("flow plan contains no steps")]
    EmptyPlan,

    #[error("submission failed: {reason}")]
    Submission { reason: String },

    #[error("confirmation failed: {reason}")]
    Confirmation { reason: String },

    #[error("{stage} timed out after {after_ms}ms")]
    Timeout { stage: ExecutionStage, after_ms: u64 },
}

impl ExecutionError {
    /// Run outcome this error resolves to. Only a signer refusal counts as a cancellation.
    pub fn outcome(&self) -> FlowOutcome {
        match self {
            ExecutionError::Rejected(_) => FlowOutcome::Cancelled,
            _ => FlowOutcome::Error,
        }
    }

    pub fn stage(&self) -> ExecutionStage {
        match self {
            ExecutionError::Rejected(_) => ExecutionStage::Signing,
            ExecutionError::Planning { .. } | ExecutionError::EmptyPlan => ExecutionStage::Planning,
            ExecutionError::Submission { .. } => ExecutionStage::Submitting,
            ExecutionError::Confirmation { .. } => ExecutionStage::Confirming,
            ExecutionError::Timeout { stage, .. } => *stage,
        }
    }
}

/// Performs the individual stages of a flow against the wallet and chain.
///
/// Holds no run state; the orchestrator records every result.
pub struct StepExecutor {
    wallet: Arc<dyn WalletConnector>,
    chain: Arc<dyn ChainClient>,
    planner: Arc<dyn FlowPlanner>,
    step_timeout: Option<Duration>,
}

impl StepExecutor {
    pub fn new(
        wallet: Arc<dyn WalletConnector>,
        chain: Arc<dyn ChainClient>,
        planner: Arc<dyn FlowPlanner>,
        step_timeout: Option<Duration>,
    ) -> Self {
        Self {
            wallet,
            chain,
            planner,
            step_timeout,
        }
    }

    pub async fn plan(&self, owner: &str) -> Result<Vec<StepPayload>, ExecutionError> {
        let steps = self
            .bounded(ExecutionStage::Planning, async {
                self.planner
                    .plan(owner)
                    .await
                    .map_err(|e| ExecutionError::Planning {
                        reason: e.to_string(),
                    })
            })
            .await?;

        if steps.is_empty() {
            return Err(ExecutionError::EmptyPlan);
        }
        Ok(steps)
    }

    pub async fn sign(&self, payload: &StepPayload) -> Result<SignedTransaction, ExecutionError> {
        self.bounded(ExecutionStage::Signing, async {
            self.wallet
                .request_signature(payload)
                .await
                .map_err(ExecutionError::from)
        })
        .await
    }

    pub async fn submit(&self, signed: &SignedTransaction) -> Result<TxHandle, ExecutionError> {
        self.bounded(ExecutionStage::Submitting, async {
            self.chain
                .submit(signed)
                .await
                .map_err(|e| ExecutionError::Submission {
                    reason: e.to_string(),
                })
        })
        .await
    }

    pub async fn confirm(&self, handle: &TxHandle) -> Result<Confirmation, ExecutionError> {
        self.bounded(ExecutionStage::Confirming, async {
            self.chain
                .confirm(handle)
                .await
                .map_err(|e| ExecutionError::Confirmation {
                    reason: e.to_string(),
                })
        })
        .await
    }

    /// Apply the configured step timeout, if any. Without one the wait is unbounded.
    async fn bounded<T, F>(&self, stage: ExecutionStage, fut: F) -> Result<T, ExecutionError>
    where
        F: Future<Output = Result<T, ExecutionError>>,
    {
        let Some(limit) = self.step_timeout else {
            return fut.await;
        };

        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                debug!(stage = %stage, timeout_ms = limit.as_millis() as u64, "Stage timed out");
                Err(ExecutionError::Timeout {
                    stage,
                    after_ms: limit.as_millis() as u64,
                })
            }
        }
    }
}
