use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use wallet_flow::monitor::NotifyError;
use wallet_flow::types::{
    AttemptStatus, ChainClient, ChainError, Confirmation, ConnectionEvent, ConnectionState,
    FeedbackContext, FlowOutcome, OutcomeNotice, OutcomeNotifier, SignedTransaction, SignerError,
    StaticPlanner, StepPayload, TokenHolding, TxHandle, WalletConnector,
};
use wallet_flow::{App, AppConfig, Collaborators, ConnectionTransport};

// ═══════════════════════════════════════════════════════════════════════════
// MOCK IMPLEMENTATIONS FOR TESTING
// ═══════════════════════════════════════════════════════════════════════════

/// Browser-style wallet: a connection channel plus a signer that can reject
struct HostWallet {
    connection: watch::Sender<ConnectionState>,
    reject_all: bool,
    signatures: AtomicUsize,
}

impl HostWallet {
    fn new(reject_all: bool) -> Arc<Self> {
        let (connection, _) = watch::channel(ConnectionState::Disconnected);
        Arc::new(Self {
            connection,
            reject_all,
            signatures: AtomicUsize::new(0),
        })
    }

    fn connect(&self, address: &str) {
        self.connection.send_replace(ConnectionState::Connected {
            address: address.to_string(),
        });
    }

    fn disconnect(&self) {
        self.connection.send_replace(ConnectionState::Disconnected);
    }
}

#[async_trait]
impl WalletConnector for HostWallet {
    fn is_connected(&self) -> bool {
        self.connection.borrow().is_connected()
    }

    fn account_address(&self) -> Option<String> {
        self.connection.borrow().address().map(str::to_string)
    }

    fn connection_events(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    async fn request_signature(
        &self,
        payload: &StepPayload,
    ) -> Result<SignedTransaction, SignerError> {
        self.signatures.fetch_add(1, Ordering::SeqCst);
        if self.reject_all {
            return Err(SignerError::UserRejected("user closed the prompt".to_string()));
        }
        Ok(SignedTransaction {
            message: payload.message.clone(),
            signature: vec![0xAB],
        })
    }
}

/// Chain with a fixed balance; confirmation can fail or be held
struct HostChain {
    lamports: u64,
    fail_confirm: bool,
    confirm_gate: Option<Arc<Notify>>,
    confirm_entered: Notify,
    balance_polls: AtomicUsize,
}

impl HostChain {
    fn with_balance(lamports: u64) -> Self {
        Self {
            lamports,
            fail_confirm: false,
            confirm_gate: None,
            confirm_entered: Notify::new(),
            balance_polls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ChainClient for HostChain {
    async fn get_balance(&self, _address: &str) -> Result<u64, ChainError> {
        self.balance_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lamports)
    }

    async fn get_token_holdings(&self, _address: &str) -> Result<Vec<TokenHolding>, ChainError> {
        Ok(vec![
            TokenHolding::new("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263", Some(Decimal::from(1_000))),
            TokenHolding::new("mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So", Some(Decimal::ZERO)),
        ])
    }

    async fn submit(&self, signed: &SignedTransaction) -> Result<TxHandle, ChainError> {
        Ok(TxHandle::new(format!("tx-{}", signed.message.len())))
    }

    async fn confirm(&self, _handle: &TxHandle) -> Result<Confirmation, ChainError> {
        self.confirm_entered.notify_one();
        if let Some(gate) = &self.confirm_gate {
            gate.notified().await;
        }
        if self.fail_confirm {
            return Err(ChainError::Confirmation("block height exceeded".to_string()));
        }
        Ok(Confirmation {
            usd_value: Decimal::new(1250, 2),
        })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<OutcomeNotice>>,
    shown: Notify,
}

impl OutcomeNotifier for RecordingNotifier {
    fn show(&self, notice: OutcomeNotice) {
        self.notices.lock().unwrap().push(notice);
        self.shown.notify_one();
    }
}

#[derive(Default)]
struct RecordingTransport {
    events: Mutex<Vec<ConnectionEvent>>,
}

#[async_trait]
impl ConnectionTransport for RecordingTransport {
    async fn notify(&self, event: &ConnectionEvent) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct Harness {
    app: App,
    wallet: Arc<HostWallet>,
    chain: Arc<HostChain>,
    notifier: Arc<RecordingNotifier>,
    transport: Arc<RecordingTransport>,
}

fn harness(wallet: Arc<HostWallet>, chain: HostChain, steps: usize) -> Harness {
    let chain = Arc::new(chain);
    let notifier = Arc::new(RecordingNotifier::default());
    let transport = Arc::new(RecordingTransport::default());
    let planner = Arc::new(StaticPlanner::new(
        (0..steps)
            .map(|i| StepPayload::new(format!("step-{i}"), vec![0; i + 1]))
            .collect(),
    ));

    let mut app = App::new(
        AppConfig::default(),
        Collaborators {
            wallet: wallet.clone(),
            chain: chain.clone(),
            planner,
            notifier: notifier.clone(),
            transport: transport.clone(),
        },
    )
    .unwrap();
    app.start();

    Harness {
        app,
        wallet,
        chain,
        notifier,
        transport,
    }
}

async fn wait_for_notice(notifier: &RecordingNotifier) -> OutcomeNotice {
    tokio::time::timeout(Duration::from_secs(5), notifier.shown.notified())
        .await
        .expect("notifier was not signalled");
    notifier.notices.lock().unwrap().last().cloned().unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// ELIGIBILITY AND CONNECTION NOTIFICATION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_connect_with_balance_above_threshold_is_eligible() {
    let wallet = HostWallet::new(false);
    let h = harness(wallet, HostChain::with_balance(100_000), 1); // 0.0001 SOL

    h.wallet.connect("owner");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = h.app.monitor().state().await;
    assert_eq!(state.wallet_balance, Some(Decimal::new(1, 4)));
    assert!(state.is_eligible);
    h.app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_connect_with_balance_below_threshold_is_not_eligible() {
    let wallet = HostWallet::new(false);
    let h = harness(wallet, HostChain::with_balance(1_000), 1); // 0.000001 SOL

    h.wallet.connect("owner");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = h.app.monitor().state().await;
    assert_eq!(state.wallet_balance, Some(Decimal::new(1, 6)));
    assert!(!state.is_eligible);
    h.app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_connection_notification_fires_once_per_session() {
    let wallet = HostWallet::new(false);
    let h = harness(wallet, HostChain::with_balance(5_000_000), 1);

    h.wallet.connect("owner");
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert!(h.chain.balance_polls.load(Ordering::SeqCst) >= 6);
    {
        let events = h.transport.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].address, "owner");
        assert_eq!(events[0].tokens.len(), 1);
        assert_eq!(events[0].tokens[0].symbol, "DezXAZ8z");
    }

    // A new session after disconnect notifies again
    h.wallet.disconnect();
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.wallet.connect("owner");
    tokio::time::sleep(Duration::from_secs(11)).await;

    assert_eq!(h.transport.events.lock().unwrap().len(), 2);
    h.app.shutdown();
}

// ═══════════════════════════════════════════════════════════════════════════
// FLOW OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_single_step_completes_silently() {
    let wallet = HostWallet::new(false);
    wallet.connect("owner");
    let h = harness(wallet, HostChain::with_balance(0), 1);
    let orchestrator = h.app.orchestrator();

    orchestrator.start_flow().await.unwrap().join().await;

    let run = orchestrator.snapshot().await.unwrap();
    assert_eq!(run.outcome, Some(FlowOutcome::Completed));
    assert!(!run.is_processing);
    assert_eq!(run.attempts.len(), 1);
    assert_eq!(run.attempts[0].status, AttemptStatus::Confirmed);
    assert_eq!(run.total_usd_value(), Decimal::new(1250, 2));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.notifier.notices.lock().unwrap().is_empty());
    h.app.shutdown();
}

#[tokio::test]
async fn test_rejection_cancels_and_opens_feedback() {
    let wallet = HostWallet::new(true);
    wallet.connect("owner");
    let h = harness(wallet, HostChain::with_balance(0), 1);
    let orchestrator = h.app.orchestrator();

    orchestrator.start_flow().await.unwrap().join().await;

    let run = orchestrator.snapshot().await.unwrap();
    assert_eq!(run.outcome, Some(FlowOutcome::Cancelled));
    assert!(!run.is_processing);
    assert_eq!(run.attempts.len(), 1);
    assert!(matches!(
        run.attempts[0].status,
        AttemptStatus::Pending | AttemptStatus::Failed
    ));

    let notice = wait_for_notice(&h.notifier).await;
    assert!(notice.open);
    assert_eq!(notice.context, FeedbackContext::Cancelled);
    assert_eq!(notice.address.as_deref(), Some("owner"));
    h.app.shutdown();
}

#[tokio::test]
async fn test_confirmation_failure_errors_and_opens_feedback() {
    let wallet = HostWallet::new(false);
    wallet.connect("owner");
    let mut chain = HostChain::with_balance(0);
    chain.fail_confirm = true;
    let h = harness(wallet, chain, 1);
    let orchestrator = h.app.orchestrator();

    orchestrator.start_flow().await.unwrap().join().await;

    let run = orchestrator.snapshot().await.unwrap();
    assert_eq!(run.outcome, Some(FlowOutcome::Error));
    assert_eq!(run.attempts[0].status, AttemptStatus::Failed);

    let notice = wait_for_notice(&h.notifier).await;
    assert_eq!(notice.context, FeedbackContext::Error);
    h.app.shutdown();
}

#[tokio::test]
async fn test_cancel_between_steps_keeps_confirmed_attempt() {
    let wallet = HostWallet::new(false);
    wallet.connect("owner");
    let gate = Arc::new(Notify::new());
    let mut chain = HostChain::with_balance(0);
    chain.confirm_gate = Some(gate.clone());
    let h = harness(wallet, chain, 2);
    let orchestrator = h.app.orchestrator();

    let start = orchestrator.start_flow().await.unwrap();
    h.chain.confirm_entered.notified().await;

    assert!(orchestrator.cancel_flow().await);
    gate.notify_one();
    start.join().await;

    let run = orchestrator.snapshot().await.unwrap();
    assert_eq!(run.outcome, Some(FlowOutcome::Cancelled));
    assert_eq!(run.attempts.len(), 1);
    assert_eq!(run.attempts[0].status, AttemptStatus::Confirmed);
    assert_eq!(h.wallet.signatures.load(Ordering::SeqCst), 1);

    let notice = wait_for_notice(&h.notifier).await;
    assert_eq!(notice.context, FeedbackContext::Cancelled);
    h.app.shutdown();
}

// ═══════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_start_while_processing_has_no_effect() {
    let wallet = HostWallet::new(false);
    wallet.connect("owner");
    let gate = Arc::new(Notify::new());
    let mut chain = HostChain::with_balance(0);
    chain.confirm_gate = Some(gate.clone());
    let h = harness(wallet, chain, 1);
    let orchestrator = h.app.orchestrator();

    let start = orchestrator.start_flow().await.unwrap();
    h.chain.confirm_entered.notified().await;
    let before = orchestrator.snapshot().await.unwrap();

    for _ in 0..3 {
        assert!(!orchestrator.start_flow().await.unwrap().is_started());
    }
    assert_eq!(orchestrator.snapshot().await.unwrap(), before);

    gate.notify_one();
    start.join().await;
    h.app.shutdown();
}

#[tokio::test]
async fn test_sequential_indices_and_single_outcome() {
    let wallet = HostWallet::new(false);
    wallet.connect("owner");
    let h = harness(wallet, HostChain::with_balance(0), 4);
    let orchestrator = h.app.orchestrator();
    let mut events = orchestrator.subscribe();

    orchestrator.start_flow().await.unwrap().join().await;

    let run = orchestrator.snapshot().await.unwrap();
    for (i, attempt) in run.attempts.iter().enumerate() {
        assert_eq!(attempt.sequence_index, i);
        assert_eq!(attempt.status, AttemptStatus::Confirmed);
    }
    assert_eq!(run.attempts.len(), 4);

    let event = events.recv().await.unwrap();
    assert_eq!(event.outcome, FlowOutcome::Completed);
    assert!(events.try_recv().is_err());
    h.app.shutdown();
}

#[tokio::test]
async fn test_metrics_exported_when_enabled() {
    let wallet = HostWallet::new(false);
    wallet.connect("owner");
    let h = harness(wallet, HostChain::with_balance(0), 1);

    h.app.orchestrator().start_flow().await.unwrap().join().await;

    let exported = h.app.export_metrics().unwrap().unwrap();
    assert!(exported.contains("wallet_flow_flows_started_total"));
    assert!(exported.contains("wallet_flow_flow_outcomes_total"));
    h.app.shutdown();
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = AppConfig::default();
    config.monitor.poll_interval_ms = 0;

    let result = App::new(
        config,
        Collaborators {
            wallet: HostWallet::new(false),
            chain: Arc::new(HostChain::with_balance(0)),
            planner: Arc::new(StaticPlanner::new(Vec::new())),
            notifier: Arc::new(RecordingNotifier::default()),
            transport: Arc::new(RecordingTransport::default()),
        },
    );
    assert!(result.is_err());
}
