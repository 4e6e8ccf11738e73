// src/blockchain/testing.rs

//! In-memory chain used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers_core::types::U256;

use super::provider::ConnectionFactory;
use super::reader::ChainReader;

#[derive(Default)]
pub struct FakeChain {
    token_balances: HashMap<(String, String), U256>,
    native_balances: HashMap<String, U256>,
    names: HashMap<String, String>,
    pub name_lookups: AtomicUsize,
}

impl FakeChain {
    pub fn with_token_balance(mut self, token: &str, holder: &str, amount: U256) -> Self {
        self.token_balances
            .insert((token.to_string(), holder.to_string()), amount);
        self
    }

    pub fn with_native_balance(mut self, address: &str, amount: U256) -> Self {
        self.native_balances.insert(address.to_string(), amount);
        self
    }

    pub fn with_name(mut self, contract: &str, name: &str) -> Self {
        self.names.insert(contract.to_string(), name.to_string());
        self
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn token_balance(&self, token: &str, holder: &str) -> Result<U256> {
        self.token_balances
            .get(&(token.to_string(), holder.to_string()))
            .copied()
            .ok_or_else(|| anyhow!("execution reverted: balanceOf({}) on {}", holder, token))
    }

    async fn native_balance(&self, address: &str) -> Result<U256> {
        self.native_balances
            .get(address)
            .copied()
            .ok_or_else(|| anyhow!("no native balance for {}", address))
    }

    async fn contract_name(&self, contract: &str) -> Result<String> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        self.names
            .get(contract)
            .cloned()
            .ok_or_else(|| anyhow!("execution reverted: name() on {}", contract))
    }
}

/// Serves one `FakeChain` for a single network id.
pub struct FakeConnections {
    pub network_id: u64,
    pub chain: Arc<FakeChain>,
}

#[async_trait]
impl ConnectionFactory for FakeConnections {
    async fn connect(&self, network_id: u64) -> Result<Arc<dyn ChainReader>> {
        if network_id != self.network_id {
            return Err(anyhow!("No RPC endpoint configured for network {}", network_id));
        }
        Ok(self.chain.clone())
    }
}
