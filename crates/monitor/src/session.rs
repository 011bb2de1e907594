use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One connected period of the wallet, from connect until disconnect.
///
/// Switching accounts while connected keeps the session; only a disconnect ends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSession {
    pub address: String,
    pub notified: bool,
    pub connected_at: DateTime<Utc>,
}

impl ConnectionSession {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            notified: false,
            connected_at: Utc::now(),
        }
    }

    /// Take the session's single notification slot.
    ///
    /// Returns true exactly once per session, before anything is delivered.
    pub fn claim_notification(&mut self) -> bool {
        if self.notified {
            return false;
        }
        self.notified = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once() {
        let mut session = ConnectionSession::new("owner");
        assert!(!session.notified);
        assert!(session.claim_notification());
        assert!(session.notified);
        assert!(!session.claim_notification());
        assert!(!session.claim_notification());
    }
}
