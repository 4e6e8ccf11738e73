// src/analysis/models.rs
use ethers_core::types::U256;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::simulation::models::TokenStandard;

/// Decimals assumed for a fungible token that does not report any.
pub const DEFAULT_DECIMALS: u32 = 18;

// --- Error types for the analysis pipeline ---

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid network id '{0}'")]
    InvalidNetworkId(String),
    #[error("{standard} asset change has no contract address")]
    MissingContractAddress { standard: String },
    #[error("invalid raw amount: {0}")]
    InvalidAmount(String),
    #[error(transparent)]
    Chain(#[from] anyhow::Error),
}

// --- Normalized token models ---

/// Token metadata copied from the simulation, with decimals resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<TokenStandard>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub decimals: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dollar_value: Option<String>,
}

/// Non-fungible token id.
///
/// Serialized as a JSON integer when it fits in 64 bits, otherwise as a
/// decimal string so large ERC1155 ids survive intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenId(pub U256);

impl TokenId {
    /// Parses the hex form the simulation reports (`0x2a`).
    pub fn from_hex(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .unwrap_or(raw);
        if digits.is_empty() {
            return None;
        }
        U256::from_str_radix(digits, 16).ok().map(TokenId)
    }
}

impl From<u64> for TokenId {
    fn from(id: u64) -> Self {
        TokenId(U256::from(id))
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 <= U256::from(u64::MAX) {
            serializer.serialize_u64(self.0.as_u64())
        } else {
            serializer.serialize_str(&self.0.to_string())
        }
    }
}

/// One asset change after normalization and balance annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenChange {
    pub token_info: TokenInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dollar_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<TokenId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_before_balance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_before_balance: Option<String>,
}

// --- Balance models ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseTokenBalance {
    pub address: String,
    pub original: String,
}

/// The contract the transaction calls, when it is also a token it moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetContract {
    pub address: String,
    pub name: String,
}

/// Aggregate result handed to the summarizer and returned to the caller.
///
/// `target_contract` and `target_contract_name` are empty strings when the
/// call target is not one of the touched token contracts; `target_address`
/// then holds the call's `to`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionAnalysis {
    pub sender_wallet_address: String,
    pub target_address: String,
    pub target_contract: String,
    pub target_contract_name: String,
    pub function_name: String,
    pub status: bool,
    pub gas_used: u64,
    pub token_changes: Vec<TokenChange>,
    pub balance_changes: Value,
    pub balance_diff: Vec<BalanceDiff>,
    pub base_token_balances: Vec<BaseTokenBalance>,
}
