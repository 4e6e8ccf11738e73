// src/analysis/pipeline.rs

use tracing::info;

use super::models::{AnalysisError, BaseTokenBalance, TransactionAnalysis};
use super::normalizer::{normalize_asset_changes, NormalizedAssets};
use super::signature::SignatureResolver;
use super::state_diff::transform_state_diff;
use crate::blockchain::balance::get_native_balance;
use crate::blockchain::provider::ConnectionFactory;
use crate::simulation::models::SimulationResult;

/// Turns a raw simulation into a `TransactionAnalysis`.
///
/// Steps run strictly in sequence. Only the signature lookup degrades on
/// failure; every other error is returned as is.
pub async fn process_transaction_data(
    result: &SimulationResult,
    connections: &dyn ConnectionFactory,
    signatures: &SignatureResolver,
) -> Result<TransactionAnalysis, AnalysisError> {
    let tx = &result.transaction;
    let tx_info = &tx.transaction_info;
    let asset_changes = tx_info.asset_changes.as_deref().unwrap_or_default();

    let network_id: u64 = tx
        .network_id
        .trim()
        .parse()
        .map_err(|_| AnalysisError::InvalidNetworkId(tx.network_id.clone()))?;
    let reader = connections.connect(network_id).await?;

    info!(
        "Processing {} asset change(s) for call {} -> {} on network {}",
        asset_changes.len(),
        tx.from,
        tx.to,
        network_id
    );
    let NormalizedAssets {
        token_changes,
        target,
    } = normalize_asset_changes(asset_changes, &tx.to, reader.as_ref()).await?;

    let (target_address, target_contract, target_contract_name) = match target {
        Some(target) => (String::new(), target.address, target.name),
        None => (tx.to.clone(), String::new(), String::new()),
    };

    let function_name = signatures.resolve(&tx.input).await;
    let balance_diff = transform_state_diff(&tx_info.balance_diff);

    let sender_balance = get_native_balance(reader.as_ref(), &tx.from).await?;
    let base_token_balances = vec![BaseTokenBalance {
        address: tx.from.clone(),
        original: sender_balance,
    }];

    Ok(TransactionAnalysis {
        sender_wallet_address: tx.from.clone(),
        target_address,
        target_contract,
        target_contract_name,
        function_name,
        status: tx.status,
        gas_used: tx.gas_used,
        token_changes,
        balance_changes: tx_info.balance_changes.clone(),
        balance_diff,
        base_token_balances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::{FakeChain, FakeConnections};
    use ethers_core::types::U256;
    use reqwest::Client;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    const SENDER: &str = "0x00000000000000000000000000000000000000a1";
    const RECIPIENT: &str = "0x00000000000000000000000000000000000000b0";
    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    const ROUTER: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";

    fn simulation(to: &str, network_id: &str) -> SimulationResult {
        serde_json::from_value(json!({
            "transaction": {
                "network_id": network_id,
                "from": SENDER,
                "to": to,
                "input": "0xa9059cbb00000000000000000000000000000000000000000000000000000000000000b0",
                "status": true,
                "gas_used": 34567,
                "transaction_info": {
                    "asset_changes": [{
                        "token_info": {
                            "standard": "ERC20",
                            "type": "Fungible",
                            "contract_address": USDC,
                            "symbol": "usdc",
                            "name": "USD Coin",
                            "decimals": 6,
                            "dollar_value": "1"
                        },
                        "from": SENDER,
                        "to": RECIPIENT,
                        "raw_amount": "2500000",
                        "dollar_value": "2.5"
                    }],
                    "balance_changes": [{ "address": SENDER, "dollar_value": "-2.5", "transfers": [0] }],
                    "balance_diff": [{ "address": SENDER, "original": "0x10", "dirty": "0x0f" }]
                }
            }
        }))
        .unwrap()
    }

    fn connections() -> FakeConnections {
        let chain = FakeChain::default()
            .with_token_balance(USDC, SENDER, U256::from(10_000_000u64))
            .with_token_balance(USDC, RECIPIENT, U256::zero())
            .with_native_balance(SENDER, U256::exp10(18) * U256::from(2u64));
        FakeConnections {
            network_id: 1,
            chain: Arc::new(chain),
        }
    }

    fn offline_signatures() -> SignatureResolver {
        SignatureResolver::new(Client::new(), "http://127.0.0.1:9", Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_call_to_token_contract_sets_target() {
        let analysis = process_transaction_data(&simulation(USDC, "1"), &connections(), &offline_signatures())
            .await
            .unwrap();

        assert_eq!(analysis.target_contract, USDC);
        assert_eq!(analysis.target_contract_name, "USD Coin");
        assert_eq!(analysis.target_address, "");
        assert_eq!(analysis.function_name, "0xa9059cbb");
        assert_eq!(analysis.gas_used, 34567);

        let change = &analysis.token_changes[0];
        assert_eq!(change.amount.as_deref(), Some("2.5"));
        assert_eq!(change.from_before_balance.as_deref(), Some("10.0"));
        assert_eq!(change.to_before_balance.as_deref(), Some("0.0"));
    }

    #[tokio::test]
    async fn test_call_to_other_contract_keeps_sentinel() {
        let analysis = process_transaction_data(&simulation(ROUTER, "1"), &connections(), &offline_signatures())
            .await
            .unwrap();

        assert_eq!(analysis.target_contract, "");
        assert_eq!(analysis.target_contract_name, "");
        assert_eq!(analysis.target_address, ROUTER);
    }

    #[tokio::test]
    async fn test_diffs_and_sender_balance() {
        let analysis = process_transaction_data(&simulation(ROUTER, "1"), &connections(), &offline_signatures())
            .await
            .unwrap();
        let out: Value = serde_json::to_value(&analysis).unwrap();

        assert_eq!(out["balance_diff"], json!([{ "address": SENDER, "original": "0x10", "new": "0x0f" }]));
        assert_eq!(out["balance_changes"][0]["dollar_value"], "-2.5");
        assert_eq!(out["base_token_balances"], json!([{ "address": SENDER, "original": "2.0" }]));
        assert_eq!(out["sender_wallet_address"], SENDER);
        assert_eq!(out["status"], true);
    }

    #[tokio::test]
    async fn test_resolved_function_name() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/signatures/")
            .match_query(mockito::Matcher::Any)
            .with_body(json!({ "results": [{ "text_signature": "transfer(address,uint256)" }] }).to_string())
            .create_async()
            .await;
        let signatures = SignatureResolver::new(Client::new(), server.url(), Duration::from_secs(2));

        let analysis = process_transaction_data(&simulation(USDC, "1"), &connections(), &signatures)
            .await
            .unwrap();
        assert_eq!(analysis.function_name, "transfer(address,uint256)");
    }

    #[tokio::test]
    async fn test_bad_network_id() {
        let err = process_transaction_data(&simulation(USDC, "mainnet"), &connections(), &offline_signatures())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidNetworkId(_)));

        let err = process_transaction_data(&simulation(USDC, "137"), &connections(), &offline_signatures())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("network 137"));
    }

    #[tokio::test]
    async fn test_failed_native_balance_propagates() {
        let chain = FakeChain::default()
            .with_token_balance(USDC, SENDER, U256::zero())
            .with_token_balance(USDC, RECIPIENT, U256::zero());
        let connections = FakeConnections {
            network_id: 1,
            chain: Arc::new(chain),
        };
        let result = process_transaction_data(&simulation(USDC, "1"), &connections, &offline_signatures()).await;
        assert!(matches!(result, Err(AnalysisError::Chain(_))));
    }
}
