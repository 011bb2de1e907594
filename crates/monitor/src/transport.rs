use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use wallet_flow_types::{ConnectionEvent, WALLET_CONNECTED_EVENT};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Destination for the one-time connection notification
#[async_trait]
pub trait ConnectionTransport: Send + Sync {
    async fn notify(&self, event: &ConnectionEvent) -> Result<(), NotifyError>;
}

/// Transport that writes the event to the log and nowhere else
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl ConnectionTransport for LogTransport {
    async fn notify(&self, event: &ConnectionEvent) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(event)?;
        info!(
            event = WALLET_CONNECTED_EVENT,
            address = %event.address,
            sol_balance = %event.sol_balance,
            tokens = event.tokens.len(),
            %payload,
            "Wallet connected"
        );
        Ok(())
    }
}
