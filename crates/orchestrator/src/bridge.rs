use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use wallet_flow_types::{FeedbackContext, OutcomeNotice, OutcomeNotifier, WalletConnector};

use crate::orchestrator::OutcomeEvent;

/// Forwards cancelled and errored runs to the outcome notifier.
///
/// Reads orchestrator events only; it never calls back into the orchestrator.
pub struct OutcomeBridge {
    wallet: Arc<dyn WalletConnector>,
    notifier: Arc<dyn OutcomeNotifier>,
    last_notified: Option<Uuid>,
}

impl OutcomeBridge {
    pub fn new(wallet: Arc<dyn WalletConnector>, notifier: Arc<dyn OutcomeNotifier>) -> Self {
        Self {
            wallet,
            notifier,
            last_notified: None,
        }
    }

    /// React to one outcome event. Returns the notice that was delivered, if any.
    pub fn handle(&mut self, event: &OutcomeEvent) -> Option<OutcomeNotice> {
        if self.last_notified == Some(event.run_id) {
            debug!(run_id = %event.run_id, "Outcome already signalled for run");
            return None;
        }

        let context = FeedbackContext::from_outcome(event.outcome)?;
        self.last_notified = Some(event.run_id);

        let notice = OutcomeNotice {
            open: true,
            address: self.wallet.account_address(),
            context,
        };

        info!(
            run_id = %event.run_id,
            outcome = %event.outcome,
            address = ?notice.address,
            "Signalling outcome notifier"
        );
        self.notifier.show(notice.clone());
        Some(notice)
    }

    /// Consume events until the orchestrator is dropped
    pub fn spawn(mut self, mut events: broadcast::Receiver<OutcomeEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        self.handle(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Outcome bridge fell behind, events dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Outcome channel closed, stopping bridge");
                        break;
                    }
                }
            }
        })
    }
}
