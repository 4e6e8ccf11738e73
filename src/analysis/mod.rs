// src/analysis/mod.rs

pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod signature;
pub mod state_diff;

pub use models::{AnalysisError, TransactionAnalysis};
pub use pipeline::process_transaction_data;
pub use signature::SignatureResolver;
