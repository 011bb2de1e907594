use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::wallet::TxHandle;

/// Per-step status of a transaction attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Pending,
    Submitted,
    Confirmed,
    Failed,
}

impl AttemptStatus {
    /// Confirmed and failed attempts never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptStatus::Confirmed | AttemptStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Pending => "pending",
            AttemptStatus::Submitted => "submitted",
            AttemptStatus::Confirmed => "confirmed",
            AttemptStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status change on an attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("attempt {sequence_index}: cannot move from {from} to {to}")]
pub struct AttemptTransitionError {
    pub sequence_index: usize,
    pub from: AttemptStatus,
    pub to: AttemptStatus,
}

/// One signed transaction within a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionAttempt {
    /// Position within the run, 0-based and contiguous
    pub sequence_index: usize,

    pub status: AttemptStatus,

    /// Estimated USD value moved by this attempt; zero until confirmed
    pub usd_value: Decimal,

    /// Chain handle, present once submitted
    pub handle: Option<TxHandle>,

    /// Why the attempt failed, if it did
    pub failure: Option<String>,

    pub started_at: DateTime<Utc>,

    pub finalized_at: Option<DateTime<Utc>>,
}

impl TransactionAttempt {
    pub fn new(sequence_index: usize) -> Self {
        Self {
            sequence_index,
            status: AttemptStatus::Pending,
            usd_value: Decimal::ZERO,
            handle: None,
            failure: None,
            started_at: Utc::now(),
            finalized_at: None,
        }
    }

    /// Pending -> Submitted
    pub fn mark_submitted(&mut self, handle: TxHandle) -> Result<(), AttemptTransitionError> {
        self.check(AttemptStatus::Pending, AttemptStatus::Submitted)?;
        self.status = AttemptStatus::Submitted;
        self.handle = Some(handle);
        Ok(())
    }

    /// Submitted -> Confirmed. Negative estimates are recorded as zero.
    pub fn mark_confirmed(&mut self, usd_value: Decimal) -> Result<(), AttemptTransitionError> {
        self.check(AttemptStatus::Submitted, AttemptStatus::Confirmed)?;
        self.status = AttemptStatus::Confirmed;
        self.usd_value = usd_value.max(Decimal::ZERO);
        self.finalized_at = Some(Utc::now());
        Ok(())
    }

    /// Pending or Submitted -> Failed
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), AttemptTransitionError> {
        if self.status.is_terminal() {
            return Err(self.transition_error(AttemptStatus::Failed));
        }
        self.status = AttemptStatus::Failed;
        self.failure = Some(reason.into());
        self.finalized_at = Some(Utc::now());
        Ok(())
    }

    fn check(&self, expected: AttemptStatus, to: AttemptStatus) -> Result<(), AttemptTransitionError> {
        if self.status != expected {
            return Err(self.transition_error(to));
        }
        Ok(())
    }

    fn transition_error(&self, to: AttemptStatus) -> AttemptTransitionError {
        AttemptTransitionError {
            sequence_index: self.sequence_index,
            from: self.status,
            to,
        }
    }
}
