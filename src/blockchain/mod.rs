// src/blockchain/mod.rs

pub mod balance;
pub mod provider;
pub mod reader;
pub mod units;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use provider::{ConnectionFactory, ProviderFactory};
pub use reader::{ChainReader, EvmChainReader};
