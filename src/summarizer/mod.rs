//! # Summarizer Module
//!
//! Turns a transaction analysis into a natural-language risk summary.
//!
//! Backends implement [`TextGenerator`]:
//! - [`openai::OpenAiGenerator`] - chat completions with per-request timeout
//!   and bounded retries
//! - [`gemini::GeminiGenerator`] - `generateContent`, errors propagate
//!
//! [`fail_soft::FailSoft`] wraps either one so callers always get text back.

pub mod fail_soft;
pub mod gemini;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, SummarizerBackend};
use fail_soft::FailSoft;
use gemini::GeminiGenerator;
use openai::OpenAiGenerator;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("{backend} API key is not configured")]
    MissingApiKey { backend: &'static str },
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Http(reqwest::Error),
    #[error("{backend} returned {status}: {body}")]
    Api {
        backend: &'static str,
        status: u16,
        body: String,
    },
    #[error("{backend} returned no text")]
    EmptyResponse { backend: &'static str },
    #[error("failed to render prompt: {0}")]
    Prompt(#[from] serde_json::Error),
}

impl SummarizerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<reqwest::Error> for SummarizerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// A text-generation backend: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, SummarizerError>;
}

/// Builds the instruction prompt followed by the pretty-printed analysis.
pub fn form_prompt<T: Serialize + ?Sized>(
    analysis: &T,
    use_emojis: bool,
) -> Result<String, serde_json::Error> {
    let emojis = if use_emojis {
        "You can use emojis to emphasise the results"
    } else {
        "Do not use any emojis in your response"
    };
    Ok(format!(
        "Analyse this transaction simulation and write a human readable summary of what this \
         transaction result means. Note that the transaction hasn't yet happened. The user wants \
         to know if this transaction is safe and doesn't have any hidden outcome. If it's a token \
         or eth transfer include the amount of that token currently in both from and to wallets. \
         If there is an error in the transaction, explain why it would fail. {}:\n{}",
        emojis,
        serde_json::to_string_pretty(analysis)?
    ))
}

#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// The configured backend wrapped in [`FailSoft`].
    pub fn from_config(client: Client, config: &Config) -> Self {
        let generator: Arc<dyn TextGenerator> = match config.summarizer_backend {
            SummarizerBackend::OpenAi => {
                Arc::new(FailSoft::new(OpenAiGenerator::from_config(client, config)))
            }
            SummarizerBackend::Gemini => Arc::new(
                FailSoft::new(GeminiGenerator::from_config(client, config))
                    .with_timeout(Duration::from_secs(config.openai_timeout_secs)),
            ),
        };
        Self::new(generator)
    }

    pub async fn summarize<T: Serialize + ?Sized + Sync>(
        &self,
        analysis: &T,
        use_emojis: bool,
    ) -> Result<String, SummarizerError> {
        let prompt = form_prompt(analysis, use_emojis)?;
        info!("Requesting transaction summary ({} chars)", prompt.len());
        self.generator.generate(&prompt).await
    }
}
