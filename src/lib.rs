// src/lib.rs

use std::sync::Arc;
use std::time::Duration;

pub mod analysis;
pub mod api;
pub mod blockchain;
pub mod config;
pub mod mcp;
pub mod simulation;
pub mod summarizer;

use analysis::SignatureResolver;
use blockchain::{ConnectionFactory, ProviderFactory};
use simulation::{Simulator, TenderlyClient};
use summarizer::Summarizer;

/// Connect timeout shared by every outbound HTTP client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: config::Config,
    /// Runs transactions against forked chain state
    pub simulator: Arc<dyn Simulator>,
    /// Opens read-only chain connections per network id
    pub connections: Arc<dyn ConnectionFactory>,
    /// Turns call data into a human readable function signature
    pub signatures: SignatureResolver,
    /// Produces the natural-language risk summary
    pub summarizer: Summarizer,
}

impl AppState {
    /// Wires the production services from configuration. All outbound HTTP
    /// traffic shares one connection pool.
    pub fn from_config(config: config::Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            simulator: Arc::new(TenderlyClient::new(client.clone(), &config)),
            connections: Arc::new(ProviderFactory::new(&config.chain_rpc_urls)),
            signatures: SignatureResolver::from_config(client.clone(), &config),
            summarizer: Summarizer::from_config(client, &config),
            config,
        })
    }
}
