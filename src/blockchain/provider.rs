// src/blockchain/provider.rs

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use ethers_providers::{Http, Provider};
use tracing::{info, warn};

use super::reader::{ChainReader, EvmChainReader};

/// Hands out a read-only connection for a numeric network id.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(&self, network_id: u64) -> Result<Arc<dyn ChainReader>>;
}

/// Lazily builds one ethers HTTP provider per configured network and reuses it
/// across invocations.
#[derive(Clone, Default)]
pub struct ProviderFactory {
    rpc_urls: HashMap<u64, String>,
    providers: Arc<DashMap<u64, Arc<Provider<Http>>>>,
}

impl ProviderFactory {
    /// Create a factory from the `network id -> RPC URL` map in the config
    pub fn new(rpc_urls: &HashMap<String, String>) -> Self {
        let mut parsed = HashMap::new();
        for (network_id, url) in rpc_urls {
            match network_id.trim().parse::<u64>() {
                Ok(id) => {
                    parsed.insert(id, url.clone());
                }
                Err(_) => warn!(
                    "Ignoring RPC URL for non-numeric network id '{}'",
                    network_id
                ),
            }
        }

        Self {
            rpc_urls: parsed,
            providers: Arc::new(DashMap::new()),
        }
    }

    fn get_provider(&self, network_id: u64) -> Result<Arc<Provider<Http>>> {
        if let Some(provider) = self.providers.get(&network_id) {
            return Ok(provider.clone());
        }

        let url = self
            .rpc_urls
            .get(&network_id)
            .ok_or_else(|| anyhow!("No RPC endpoint configured for network {}", network_id))?;
        let provider = Provider::<Http>::try_from(url.as_str())
            .map_err(|e| anyhow!("Failed to create provider for network {}: {}", network_id, e))?;

        info!("Created RPC provider for network {}", network_id);
        let provider = self
            .providers
            .entry(network_id)
            .or_insert_with(|| Arc::new(provider))
            .clone();
        Ok(provider)
    }
}

#[async_trait]
impl ConnectionFactory for ProviderFactory {
    async fn connect(&self, network_id: u64) -> Result<Arc<dyn ChainReader>> {
        let provider = self.get_provider(network_id)?;
        Ok(Arc::new(EvmChainReader::new(provider)))
    }
}
