use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use wallet_flow_telemetry::FlowMetrics;
use wallet_flow_types::{ChainClient, ChainError, ConnectionEvent, ConnectionState};

use crate::eligibility::{is_eligible, lamports_to_sol, MIN_ELIGIBLE_BALANCE};
use crate::session::ConnectionSession;
use crate::transport::ConnectionTransport;

/// Configuration for the balance monitor
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Delay between balance polls while connected
    pub poll_interval: Duration,

    /// Minimum SOL balance that counts as eligible
    pub min_eligible_balance: Decimal,

    /// Send the one-time connection notification
    pub connect_notifications: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            min_eligible_balance: MIN_ELIGIBLE_BALANCE,
            connect_notifications: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("balance query failed for {address}: {source}")]
    Balance {
        address: String,
        #[source]
        source: ChainError,
    },
}

/// Latest observed balance and the current connection session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorState {
    pub wallet_balance: Option<Decimal>,
    pub is_eligible: bool,
    pub session: Option<ConnectionSession>,
}

/// What happened to the connection notification during a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Delivered,
    Failed { reason: String },
}

/// Result of a single successful poll
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub wallet_balance: Decimal,
    pub is_eligible: bool,
    /// `None` when no notification was attempted on this poll
    pub notification: Option<Notification>,
}

/// Polls the wallet balance and sends the connection notification once per session
#[derive(Clone)]
pub struct BalanceMonitor {
    chain: Arc<dyn ChainClient>,
    transport: Arc<dyn ConnectionTransport>,
    config: MonitorConfig,
    metrics: Option<Arc<FlowMetrics>>,
    state: Arc<RwLock<MonitorState>>,
}

impl BalanceMonitor {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        transport: Arc<dyn ConnectionTransport>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            chain,
            transport,
            config,
            metrics: None,
            state: Arc::new(RwLock::new(MonitorState::default())),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<FlowMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub async fn state(&self) -> MonitorState {
        self.state.read().await.clone()
    }

    /// Refresh the balance for `address` and notify if the session has not been notified yet
    pub async fn poll(&self, address: &str) -> Result<PollReport, MonitorError> {
        let lamports = match self.chain.get_balance(address).await {
            Ok(lamports) => {
                self.record_poll(true);
                lamports
            }
            Err(source) => {
                self.record_poll(false);
                return Err(MonitorError::Balance {
                    address: address.to_string(),
                    source,
                });
            }
        };

        let wallet_balance = lamports_to_sol(lamports);
        let eligible = is_eligible(wallet_balance, self.config.min_eligible_balance);

        let claimed = {
            let mut state = self.state.write().await;
            state.wallet_balance = Some(wallet_balance);
            state.is_eligible = eligible;

            let session = state
                .session
                .get_or_insert_with(|| ConnectionSession::new(address));
            if session.address != address {
                debug!(from = %session.address, to = %address, "Account switched within session");
                session.address = address.to_string();
            }
            self.config.connect_notifications && session.claim_notification()
        };

        debug!(%address, balance = %wallet_balance, eligible, "Balance refreshed");

        let notification = if claimed {
            Some(self.notify_connected(address, wallet_balance).await)
        } else {
            None
        };

        Ok(PollReport {
            wallet_balance,
            is_eligible: eligible,
            notification,
        })
    }

    /// End the current session and forget the last balance
    pub async fn reset_session(&self) {
        let mut state = self.state.write().await;
        if state.session.take().is_some() {
            debug!("Connection session ended");
        }
        state.wallet_balance = None;
        state.is_eligible = false;
    }

    /// Follow the wallet's connection state until the sender is dropped or the handle is stopped
    pub fn spawn(&self, mut connection: watch::Receiver<ConnectionState>) -> MonitorHandle {
        let monitor = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                let current = connection.borrow_and_update().clone();
                match current.address() {
                    Some(address) => {
                        if !monitor.watch_connected(address, &mut connection).await {
                            break;
                        }
                    }
                    None => {
                        monitor.reset_session().await;
                        if connection.changed().await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Connection channel closed, stopping balance monitor");
        });

        MonitorHandle { handle }
    }

    /// Poll on an interval until the connection state changes.
    ///
    /// Returns false once the connection channel is closed.
    async fn watch_connected(
        &self,
        address: &str,
        connection: &mut watch::Receiver<ConnectionState>,
    ) -> bool {
        info!(%address, interval_ms = self.config.poll_interval.as_millis() as u64, "Balance monitor started");

        let mut ticker = time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.poll(address).await {
                        warn!(error = %e, "Balance poll failed");
                    }
                }
                changed = connection.changed() => {
                    return changed.is_ok();
                }
            }
        }
    }

    async fn notify_connected(&self, address: &str, sol_balance: Decimal) -> Notification {
        let holdings = match self.chain.get_token_holdings(address).await {
            Ok(holdings) => holdings,
            Err(e) => {
                warn!(%address, error = %e, "Token holdings unavailable, connection notification dropped");
                self.record_notification(false);
                return Notification::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let event = ConnectionEvent::new(address, sol_balance, &holdings);
        match self.transport.notify(&event).await {
            Ok(()) => {
                info!(%address, tokens = event.tokens.len(), "Connection notification delivered");
                self.record_notification(true);
                Notification::Delivered
            }
            Err(e) => {
                warn!(%address, error = %e, "Connection notification failed");
                self.record_notification(false);
                Notification::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn record_poll(&self, success: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_balance_poll(success);
        }
    }

    fn record_notification(&self, delivered: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_connect_notification(delivered);
        }
    }
}

/// Owns the spawned monitor task
#[derive(Debug)]
pub struct MonitorHandle {
    handle: JoinHandle<()>,
}

impl MonitorHandle {
    /// Cancel the poll timer and the task behind it
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to exit on its own
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                warn!(error = %e, "Balance monitor task failed");
            }
        }
    }
}
