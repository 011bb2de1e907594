use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::attempt::TransactionAttempt;

/// Terminal classification of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowOutcome {
    Completed,
    Cancelled,
    Error,
}

impl FlowOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowOutcome::Completed => "completed",
            FlowOutcome::Cancelled => "cancelled",
            FlowOutcome::Error => "error",
        }
    }
}

impl fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate state of one invocation of the flow.
///
/// `outcome` is `None` while the run is processing and is set exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationRun {
    pub run_id: Uuid,

    /// Append-only while the run is active
    pub attempts: Vec<TransactionAttempt>,

    /// Index of the attempt in flight, or `attempts.len()` when none is
    pub current_index: usize,

    pub is_processing: bool,

    pub outcome: Option<FlowOutcome>,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,
}

impl OrchestrationRun {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            attempts: Vec::new(),
            current_index: 0,
            is_processing: true,
            outcome: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Append a pending attempt and make it current. Returns its sequence index.
    pub fn begin_attempt(&mut self) -> usize {
        let index = self.attempts.len();
        self.attempts.push(TransactionAttempt::new(index));
        self.current_index = index;
        index
    }

    pub fn attempt(&self, index: usize) -> Option<&TransactionAttempt> {
        self.attempts.get(index)
    }

    pub fn attempt_mut(&mut self, index: usize) -> Option<&mut TransactionAttempt> {
        self.attempts.get_mut(index)
    }

    /// Record the terminal outcome. Only the first call has any effect.
    pub fn finish(&mut self, outcome: FlowOutcome) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(outcome);
        self.is_processing = false;
        self.current_index = self.attempts.len();
        self.finished_at = Some(Utc::now());
        true
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Sum of the USD value recorded across all attempts
    pub fn total_usd_value(&self) -> Decimal {
        self.attempts.iter().map(|a| a.usd_value).sum()
    }
}

impl Default for OrchestrationRun {
    fn default() -> Self {
        Self::new()
    }
}
