//! Balance polling, eligibility and the one-time connection notification

pub mod eligibility;
pub mod monitor;
pub mod session;
pub mod transport;

pub use eligibility::{is_eligible, lamports_to_sol, LAMPORTS_PER_SOL, MIN_ELIGIBLE_BALANCE};
pub use monitor::{
    BalanceMonitor, MonitorConfig, MonitorError, MonitorHandle, MonitorState, Notification,
    PollReport,
};
pub use session::ConnectionSession;
pub use transport::{ConnectionTransport, LogTransport, NotifyError};
