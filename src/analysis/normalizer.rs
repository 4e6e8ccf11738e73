// src/analysis/normalizer.rs

use tracing::{debug, warn};

use super::models::{AnalysisError, TargetContract, TokenChange, TokenId, TokenInfo, DEFAULT_DECIMALS};
use crate::blockchain::balance::{get_native_balance, get_token_balance};
use crate::blockchain::reader::ChainReader;
use crate::blockchain::units::format_raw_amount;
use crate::simulation::models::{RawAssetChange, TokenStandard};

/// Asset changes in input order plus the resolved call target, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAssets {
    pub token_changes: Vec<TokenChange>,
    pub target: Option<TargetContract>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Canonical shape of one asset change, before any on-chain reads.
///
/// - ERC721/ERC1155: decimals forced to 0, hex `token_id` parsed to an integer.
/// - Everything else: `token_id` dropped; for ERC20 a missing `amount` is
///   derived from `raw_amount`, which is then dropped.
pub fn shape_asset_change(raw: &RawAssetChange) -> Result<TokenChange, AnalysisError> {
    let info = &raw.token_info;
    let mut decimals = info.decimals.filter(|d| *d != 0).unwrap_or(DEFAULT_DECIMALS);
    let mut amount = raw.amount.clone();
    let mut raw_amount = raw.raw_amount.clone();
    let mut token_id = None;

    match &info.standard {
        Some(standard) if standard.is_non_fungible() => {
            decimals = 0;
            if let Some(id) = non_empty(&raw.token_id) {
                token_id = TokenId::from_hex(id);
                if token_id.is_none() {
                    warn!("Dropping unparsable token id '{}'", id);
                }
            }
        }
        Some(TokenStandard::Erc20) => {
            if amount.is_none() {
                if let Some(raw_value) = raw_amount.take() {
                    let formatted = format_raw_amount(&raw_value, decimals)
                        .map_err(|e| AnalysisError::InvalidAmount(e.to_string()))?;
                    amount = Some(formatted);
                }
            }
        }
        _ => {}
    }

    Ok(TokenChange {
        token_info: TokenInfo {
            standard: info.standard.clone(),
            kind: info.kind.clone(),
            contract_address: info.contract_address.clone(),
            symbol: info.symbol.clone(),
            name: info.name.clone(),
            decimals,
            dollar_value: info.dollar_value.clone(),
        },
        from: raw.from.clone(),
        to: raw.to.clone(),
        amount,
        raw_amount,
        dollar_value: raw.dollar_value.clone(),
        token_id,
        from_before_balance: None,
        to_before_balance: None,
    })
}

async fn holder_balance(
    info: &TokenInfo,
    holder: &str,
    reader: &dyn ChainReader,
) -> Result<String, AnalysisError> {
    if info.standard == Some(TokenStandard::Native) {
        return Ok(get_native_balance(reader, holder).await?);
    }
    let contract = non_empty(&info.contract_address).ok_or_else(|| {
        AnalysisError::MissingContractAddress {
            standard: info
                .standard
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    })?;
    Ok(get_token_balance(reader, contract, holder, info.decimals).await?)
}

/// Attaches the pre-transaction balances of `from` and `to`. A missing side
/// is skipped.
pub async fn annotate_balances(
    change: &mut TokenChange,
    reader: &dyn ChainReader,
) -> Result<(), AnalysisError> {
    if let Some(from) = non_empty(&change.from).map(str::to_string) {
        change.from_before_balance = Some(holder_balance(&change.token_info, &from, reader).await?);
    }
    if let Some(to) = non_empty(&change.to).map(str::to_string) {
        change.to_before_balance = Some(holder_balance(&change.token_info, &to, reader).await?);
    }
    Ok(())
}

/// One step of the target-contract fold. The first change whose contract is
/// the call's `to` wins; later matches leave the accumulator untouched.
pub async fn resolve_target(
    acc: Option<TargetContract>,
    change: &TokenChange,
    call_to: &str,
    reader: &dyn ChainReader,
) -> Result<Option<TargetContract>, AnalysisError> {
    if acc.is_some() || call_to.is_empty() {
        return Ok(acc);
    }
    let Some(address) = non_empty(&change.token_info.contract_address) else {
        return Ok(None);
    };
    // EIP-55 checksummed and lowercase forms name the same contract
    if !address.eq_ignore_ascii_case(call_to) {
        return Ok(None);
    }

    let name = match non_empty(&change.token_info.name) {
        Some(name) => name.to_string(),
        None => reader.contract_name(address).await?,
    };
    debug!("Call target {} is token contract '{}'", address, name);
    Ok(Some(TargetContract {
        address: address.to_string(),
        name,
    }))
}

/// Runs every asset change through shaping, balance annotation and target
/// resolution, one at a time and in input order.
pub async fn normalize_asset_changes(
    raw_changes: &[RawAssetChange],
    call_to: &str,
    reader: &dyn ChainReader,
) -> Result<NormalizedAssets, AnalysisError> {
    let mut token_changes = Vec::with_capacity(raw_changes.len());
    let mut target = None;

    for raw in raw_changes {
        let mut change = shape_asset_change(raw)?;
        annotate_balances(&mut change, reader).await?;
        target = resolve_target(target, &change, call_to, reader).await?;
        token_changes.push(change);
    }

    Ok(NormalizedAssets {
        token_changes,
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::FakeChain;
    use ethers_core::types::U256;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    const TOKEN: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
    const ALICE: &str = "0x00000000000000000000000000000000000000a1";
    const BOB: &str = "0x00000000000000000000000000000000000000b0";

    fn raw(value: serde_json::Value) -> RawAssetChange {
        serde_json::from_value(value).unwrap()
    }

    fn erc20_transfer() -> RawAssetChange {
        raw(json!({
            "token_info": {
                "standard": "ERC20",
                "type": "Fungible",
                "contract_address": TOKEN,
                "symbol": "dai",
                "name": "Dai Stablecoin",
                "logo": "https://assets.example/dai.png",
                "decimals": 18,
                "dollar_value": "1.0001"
            },
            "from": ALICE,
            "to": BOB,
            "raw_amount": "1000000000000000000",
            "dollar_value": null,
            "token_id": "0x01"
        }))
    }

    #[test]
    fn test_erc20_amount_derived_from_raw_amount() {
        let change = shape_asset_change(&erc20_transfer()).unwrap();
        assert_eq!(change.amount.as_deref(), Some("1.0"));
        assert!(change.raw_amount.is_none());
        assert!(change.token_id.is_none());

        let out = serde_json::to_value(&change).unwrap();
        assert!(out.get("raw_amount").is_none());
        assert!(out.get("dollar_value").is_none());
        assert!(out["token_info"].get("logo").is_none());
        assert_eq!(out["token_info"]["dollar_value"], "1.0001");
    }

    #[test]
    fn test_existing_amount_is_kept() {
        let mut change = erc20_transfer();
        change.amount = Some("1".into());
        let shaped = shape_asset_change(&change).unwrap();
        assert_eq!(shaped.amount.as_deref(), Some("1"));
        assert_eq!(shaped.raw_amount.as_deref(), Some("1000000000000000000"));
    }

    #[test]
    fn test_missing_or_zero_decimals_default_to_18() {
        let mut change = erc20_transfer();
        change.token_info.decimals = Some(0);
        assert_eq!(shape_asset_change(&change).unwrap().token_info.decimals, 18);
        change.token_info.decimals = None;
        assert_eq!(shape_asset_change(&change).unwrap().token_info.decimals, 18);
    }

    #[test]
    fn test_non_erc20_fungibles_pass_amounts_through() {
        let change = raw(json!({
            "token_info": { "standard": "NativeCurrency", "symbol": "ETH", "decimals": 18 },
            "from": ALICE,
            "to": BOB,
            "raw_amount": "5",
            "token_id": "0x05"
        }));
        let shaped = shape_asset_change(&change).unwrap();
        assert!(shaped.amount.is_none());
        assert_eq!(shaped.raw_amount.as_deref(), Some("5"));
        assert!(shaped.token_id.is_none());
    }

    #[test]
    fn test_erc721_token_id_and_decimals() {
        let change = raw(json!({
            "token_info": { "standard": "ERC721", "contract_address": TOKEN, "decimals": 18 },
            "from": ALICE,
            "to": BOB,
            "amount": "1",
            "token_id": "0x2a"
        }));
        let shaped = shape_asset_change(&change).unwrap();
        assert_eq!(shaped.token_info.decimals, 0);
        assert_eq!(shaped.token_id, Some(TokenId::from(42)));
        assert_eq!(serde_json::to_value(&shaped).unwrap()["token_id"], json!(42));
    }

    #[test]
    fn test_invalid_raw_amount_is_an_error() {
        let mut change = erc20_transfer();
        change.raw_amount = Some("12abc".into());
        assert!(matches!(
            shape_asset_change(&change),
            Err(AnalysisError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_oversized_decimals_still_format() {
        let mut change = erc20_transfer();
        change.token_info.decimals = Some(80);
        change.raw_amount = Some("5".into());
        let shaped = shape_asset_change(&change).unwrap();
        assert_eq!(shaped.amount, Some(format!("0.{}5", "0".repeat(79))));
    }

    #[tokio::test]
    async fn test_balances_are_annotated() {
        let chain = FakeChain::default()
            .with_token_balance(TOKEN, ALICE, U256::exp10(18) * U256::from(3u64))
            .with_token_balance(TOKEN, BOB, U256::zero());
        let mut change = shape_asset_change(&erc20_transfer()).unwrap();
        annotate_balances(&mut change, &chain).await.unwrap();
        assert_eq!(change.from_before_balance.as_deref(), Some("3.0"));
        assert_eq!(change.to_before_balance.as_deref(), Some("0.0"));
    }

    #[tokio::test]
    async fn test_missing_sides_are_skipped() {
        let chain = FakeChain::default().with_token_balance(TOKEN, BOB, U256::from(10u64));
        let mut mint = erc20_transfer();
        mint.from = None;
        let mut change = shape_asset_change(&mint).unwrap();
        annotate_balances(&mut change, &chain).await.unwrap();
        assert!(change.from_before_balance.is_none());
        assert_eq!(change.to_before_balance.as_deref(), Some("0.00000000000000001"));
    }

    #[tokio::test]
    async fn test_native_changes_use_native_balance() {
        let chain = FakeChain::default()
            .with_native_balance(ALICE, U256::exp10(18))
            .with_native_balance(BOB, U256::zero());
        let native = raw(json!({
            "token_info": { "standard": "NativeCurrency", "symbol": "ETH" },
            "from": ALICE,
            "to": BOB,
            "amount": "0.5"
        }));
        let mut change = shape_asset_change(&native).unwrap();
        annotate_balances(&mut change, &chain).await.unwrap();
        assert_eq!(change.from_before_balance.as_deref(), Some("1.0"));
    }

    #[tokio::test]
    async fn test_failed_balance_read_propagates() {
        let chain = FakeChain::default();
        let err = normalize_asset_changes(&[erc20_transfer()], "0xrouter", &chain)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("balanceOf"));
    }

    #[tokio::test]
    async fn test_first_matching_change_is_the_target() {
        let chain = FakeChain::default()
            .with_token_balance(TOKEN, ALICE, U256::zero())
            .with_token_balance(TOKEN, BOB, U256::zero())
            .with_name(TOKEN, "On-chain Dai");
        let mut unnamed = erc20_transfer();
        unnamed.token_info.name = None;
        let mut renamed = erc20_transfer();
        renamed.token_info.name = Some("Second".into());

        let assets = normalize_asset_changes(&[unnamed, renamed], TOKEN, &chain)
            .await
            .unwrap();
        assert_eq!(assets.token_changes.len(), 2);
        assert_eq!(
            assets.target,
            Some(TargetContract {
                address: TOKEN.to_string(),
                name: "On-chain Dai".to_string()
            })
        );
        assert_eq!(chain.name_lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_target_name_prefers_token_info() {
        let chain = FakeChain::default();
        let mut change = shape_asset_change(&erc20_transfer()).unwrap();
        change.from = None;
        change.to = None;
        let target = resolve_target(None, &change, TOKEN, &chain).await.unwrap();
        assert_eq!(target.unwrap().name, "Dai Stablecoin");
        assert_eq!(chain.name_lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_match_leaves_target_empty() {
        let chain = FakeChain::default();
        let change = shape_asset_change(&erc20_transfer()).unwrap();
        let target = resolve_target(None, &change, "0xrouter", &chain).await.unwrap();
        assert!(target.is_none());
    }

    #[tokio::test]
    async fn test_checksummed_call_target_matches_lowercase_contract() {
        let chain = FakeChain::default();
        let change = shape_asset_change(&erc20_transfer()).unwrap();
        let checksummed = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
        let target = resolve_target(None, &change, checksummed, &chain).await.unwrap();
        assert_eq!(
            target,
            Some(TargetContract {
                address: TOKEN.to_string(),
                name: "Dai Stablecoin".to_string()
            })
        );
    }
}
