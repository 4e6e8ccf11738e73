// src/simulation/models.rs
//
// Shapes of the simulation provider's response, as far as the analysis reads
// them. Unknown fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token standard as reported on an asset change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TokenStandard {
    Erc20,
    Erc721,
    Erc1155,
    Native,
    Other(String),
}

impl TokenStandard {
    /// ERC721 and ERC1155 carry a token id and no decimals.
    pub fn is_non_fungible(&self) -> bool {
        matches!(self, Self::Erc721 | Self::Erc1155)
    }
}

impl From<String> for TokenStandard {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "ERC20" => Self::Erc20,
            "ERC721" => Self::Erc721,
            "ERC1155" => Self::Erc1155,
            "NativeCurrency" => Self::Native,
            _ => Self::Other(raw),
        }
    }
}

impl From<TokenStandard> for String {
    fn from(standard: TokenStandard) -> Self {
        match standard {
            TokenStandard::Erc20 => "ERC20".to_string(),
            TokenStandard::Erc721 => "ERC721".to_string(),
            TokenStandard::Erc1155 => "ERC1155".to_string(),
            TokenStandard::Native => "NativeCurrency".to_string(),
            TokenStandard::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTokenInfo {
    #[serde(default)]
    pub standard: Option<TokenStandard>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub dollar_value: Option<String>,
}

/// One token or native-currency movement recorded by the simulation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAssetChange {
    pub token_info: RawTokenInfo,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub raw_amount: Option<String>,
    #[serde(default)]
    pub dollar_value: Option<String>,
    #[serde(default)]
    pub token_id: Option<String>,
}

/// Per-address before/after snapshot. Passed through without validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStateDiff {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub original: Option<Value>,
    #[serde(default)]
    pub dirty: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionInfo {
    #[serde(default)]
    pub asset_changes: Option<Vec<RawAssetChange>>,
    #[serde(default)]
    pub balance_changes: Value,
    pub balance_diff: Vec<RawStateDiff>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedTransaction {
    pub network_id: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub input: String,
    pub status: bool,
    pub gas_used: u64,
    pub transaction_info: TransactionInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationResult {
    pub transaction: SimulatedTransaction,
}

/// What the tool asks the simulation provider to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRequest {
    pub network_id: String,
    pub from: String,
    pub to: String,
    /// Ether-denominated value, as passed to the tool.
    pub value: Option<String>,
    pub data: String,
}
