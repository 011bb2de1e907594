//! Interfaces of the collaborators the flow talks to.
//!
//! Wallet, chain and notifier live outside this workspace; these traits are
//! the only contact surface.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::notification::OutcomeNotice;
use crate::wallet::{
    Confirmation, ConnectionState, SignedTransaction, StepPayload, TokenHolding, TxHandle,
};

/// Signer refusal. Every variant ends a run as cancelled.
#[derive(Debug, Clone, Error)]
pub enum SignerError {
    #[error("user rejected the request: {0}")]
    UserRejected(String),

    #[error("wallet rejected the request: {0}")]
    WalletRejected(String),
}

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("submission failed: {0}")]
    Submission(String),

    #[error("confirmation failed: {0}")]
    Confirmation(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}

#[derive(Debug, Clone, Error)]
pub enum PlanError {
    #[error("failed to build flow plan: {0}")]
    Build(String),
}

/// Wallet connection and signer capability
#[async_trait]
pub trait WalletConnector: Send + Sync {
    fn is_connected(&self) -> bool;

    fn account_address(&self) -> Option<String>;

    /// Stream of connection changes, starting from the current state
    fn connection_events(&self) -> watch::Receiver<ConnectionState>;

    /// Ask the wallet to sign. May wait indefinitely for the user.
    async fn request_signature(&self, payload: &StepPayload) -> Result<SignedTransaction, SignerError>;
}

/// Chain access used by the orchestrator and the balance monitor
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Native balance in lamports
    async fn get_balance(&self, address: &str) -> Result<u64, ChainError>;

    async fn get_token_holdings(&self, address: &str) -> Result<Vec<TokenHolding>, ChainError>;

    async fn submit(&self, signed: &SignedTransaction) -> Result<TxHandle, ChainError>;

    async fn confirm(&self, handle: &TxHandle) -> Result<Confirmation, ChainError>;
}

/// Produces the ordered steps of a flow for the connected account
#[async_trait]
pub trait FlowPlanner: Send + Sync {
    async fn plan(&self, owner: &str) -> Result<Vec<StepPayload>, PlanError>;
}

/// Planner returning the same steps for every owner
#[derive(Debug, Clone, Default)]
pub struct StaticPlanner {
    steps: Vec<StepPayload>,
}

impl StaticPlanner {
    pub fn new(steps: Vec<StepPayload>) -> Self {
        Self { steps }
    }
}

#[async_trait]
impl FlowPlanner for StaticPlanner {
    async fn plan(&self, _owner: &str) -> Result<Vec<StepPayload>, PlanError> {
        Ok(self.steps.clone())
    }
}

/// UI surface that opens a feedback prompt
pub trait OutcomeNotifier: Send + Sync {
    fn show(&self, notice: OutcomeNotice);
}
