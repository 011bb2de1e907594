use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::run::FlowOutcome;
use crate::wallet::TokenHolding;

/// Event name used for the one-time connection notification
pub const WALLET_CONNECTED_EVENT: &str = "wallet_connected";

/// Length of the mint prefix used as a display symbol
const SYMBOL_LEN: usize = 8;

/// Which feedback prompt the notifier should open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackContext {
    Cancelled,
    Error,
}

impl FeedbackContext {
    /// Completed runs have no feedback context
    pub fn from_outcome(outcome: FlowOutcome) -> Option<Self> {
        match outcome {
            FlowOutcome::Cancelled => Some(FeedbackContext::Cancelled),
            FlowOutcome::Error => Some(FeedbackContext::Error),
            FlowOutcome::Completed => None,
        }
    }
}

/// Signal delivered to the outcome notifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeNotice {
    pub open: bool,
    pub address: Option<String>,
    pub context: FeedbackContext,
}

/// Non-zero token balance included in the connection notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub mint: String,
    pub symbol: String,
    pub amount: Decimal,
}

impl TokenBalance {
    /// Keep only holdings with a known, positive amount
    pub fn from_holding(holding: &TokenHolding) -> Option<Self> {
        let amount = holding.amount.filter(|a| *a > Decimal::ZERO)?;
        Some(Self {
            mint: holding.mint.clone(),
            symbol: holding.mint.chars().take(SYMBOL_LEN).collect(),
            amount,
        })
    }
}

/// Payload of the `wallet_connected` notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEvent {
    pub address: String,
    pub sol_balance: Decimal,
    pub tokens: Vec<TokenBalance>,
}

impl ConnectionEvent {
    pub fn new(address: impl Into<String>, sol_balance: Decimal, holdings: &[TokenHolding]) -> Self {
        Self {
            address: address.into(),
            sol_balance,
            tokens: holdings.iter().filter_map(TokenBalance::from_holding).collect(),
        }
    }
}
