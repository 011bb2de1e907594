use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier returned by the chain once a transaction is submitted
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHandle(String);

impl TxHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unsigned work item for one step of a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepPayload {
    /// Human readable label shown in wallet prompts and logs
    pub label: String,

    /// Serialized transaction message handed to the signer
    pub message: Vec<u8>,
}

impl StepPayload {
    pub fn new(label: impl Into<String>, message: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            message: message.into(),
        }
    }
}

/// Transaction as returned by the wallet signer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub message: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Result of a successful confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    /// Estimated USD value moved by the transaction
    pub usd_value: Decimal,
}

/// Wallet connection as seen by observers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected { address: String },
}

impl ConnectionState {
    pub fn address(&self) -> Option<&str> {
        match self {
            ConnectionState::Connected { address } => Some(address),
            ConnectionState::Disconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }
}

/// Raw token account entry reported by the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHolding {
    pub mint: String,

    /// UI amount; `None` when the chain could not resolve decimals
    pub amount: Option<Decimal>,
}

impl TokenHolding {
    pub fn new(mint: impl Into<String>, amount: Option<Decimal>) -> Self {
        Self {
            mint: mint.into(),
            amount,
        }
    }
}
