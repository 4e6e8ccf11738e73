// src/blockchain/reader.rs

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers_core::abi::{decode, encode, ParamType, Token};
use ethers_core::types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256};
use ethers_core::utils::keccak256;
use ethers_providers::{Http, Middleware, Provider};
use tracing::debug;

/// Read-only view of one network, as needed to annotate a simulation.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Raw `balanceOf(holder)` of a token contract.
    async fn token_balance(&self, token: &str, holder: &str) -> Result<U256>;

    /// Native-currency balance in wei.
    async fn native_balance(&self, address: &str) -> Result<U256>;

    /// `name()` of a contract.
    async fn contract_name(&self, contract: &str) -> Result<String>;
}

fn selector(sig: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(sig.as_bytes())[0..4]);
    sel
}

fn encode_call(sig: &str, tokens: Vec<Token>) -> Bytes {
    let mut out = selector(sig).to_vec();
    out.extend(encode(&tokens));
    Bytes::from(out)
}

fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim()).map_err(|e| anyhow!("invalid address '{}': {}", value, e))
}

pub(crate) fn decode_u256(bytes: &[u8]) -> Result<U256> {
    match decode(&[ParamType::Uint(256)], bytes)?.first() {
        Some(Token::Uint(n)) => Ok(*n),
        _ => Err(anyhow!("eth_call result is not a uint256")),
    }
}

pub(crate) fn decode_string(bytes: &[u8]) -> Option<String> {
    if let Ok(tokens) = decode(&[ParamType::String], bytes) {
        if let Some(Token::String(s)) = tokens.first() {
            return Some(s.clone());
        }
    }
    // Older tokens (e.g. MKR) return bytes32
    if let Ok(tokens) = decode(&[ParamType::FixedBytes(32)], bytes) {
        if let Some(Token::FixedBytes(b)) = tokens.first() {
            let raw: Vec<u8> = b.iter().copied().take_while(|c| *c != 0u8).collect();
            return String::from_utf8(raw).ok();
        }
    }
    None
}

/// `ChainReader` backed by an ethers HTTP provider.
#[derive(Clone, Debug)]
pub struct EvmChainReader {
    provider: Arc<Provider<Http>>,
}

impl EvmChainReader {
    pub fn new(provider: Arc<Provider<Http>>) -> Self {
        Self { provider }
    }

    async fn eth_call(&self, to: &str, data: Bytes) -> Result<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(parse_address(to)?)
            .data(data)
            .into();
        self.provider
            .call(&tx, None)
            .await
            .with_context(|| format!("eth_call to {} failed", to))
    }
}

#[async_trait]
impl ChainReader for EvmChainReader {
    async fn token_balance(&self, token: &str, holder: &str) -> Result<U256> {
        debug!("balanceOf({}) on {}", holder, token);
        let data = encode_call("balanceOf(address)", vec![Token::Address(parse_address(holder)?)]);
        let raw = self.eth_call(token, data).await?;
        decode_u256(&raw).with_context(|| format!("unexpected balanceOf result from {}", token))
    }

    async fn native_balance(&self, address: &str) -> Result<U256> {
        debug!("eth_getBalance({})", address);
        self.provider
            .get_balance(parse_address(address)?, None)
            .await
            .with_context(|| format!("eth_getBalance for {} failed", address))
    }

    async fn contract_name(&self, contract: &str) -> Result<String> {
        let raw = self.eth_call(contract, encode_call("name()", vec![])).await?;
        decode_string(&raw).ok_or_else(|| anyhow!("contract {} returned an undecodable name", contract))
    }
}
