// src/analysis/signature.rs

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;

/// `0x` plus four bytes.
const SELECTOR_LEN: usize = 10;

#[derive(Debug, Deserialize)]
struct SignatureRecord {
    #[serde(default)]
    text_signature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignatureLookup {
    #[serde(default)]
    results: Vec<SignatureRecord>,
}

/// The 4-byte selector prefix of call data, or the whole string when shorter.
pub fn function_selector(input: &str) -> &str {
    input.get(..SELECTOR_LEN).unwrap_or(input)
}

/// Best-effort selector -> text signature lookup against a 4byte-style
/// directory. Never fails: every miss or error yields the selector itself.
#[derive(Clone, Debug)]
pub struct SignatureResolver {
    client: Client,
    api_url: String,
    timeout: Duration,
}

impl SignatureResolver {
    pub fn new(client: Client, api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(
            client,
            config.signature_api_url.clone(),
            Duration::from_secs(config.signature_timeout_secs),
        )
    }

    pub async fn resolve(&self, input: &str) -> String {
        let selector = function_selector(input);
        if selector.len() < SELECTOR_LEN {
            return selector.to_string();
        }

        match self.lookup(selector).await {
            Ok(Some(signature)) => {
                debug!("Resolved {} to {}", selector, signature);
                signature
            }
            Ok(None) => selector.to_string(),
            Err(e) => {
                warn!("Signature lookup for {} failed: {:#}", selector, e);
                selector.to_string()
            }
        }
    }

    async fn lookup(&self, selector: &str) -> Result<Option<String>> {
        let url = format!("{}/api/v1/signatures/", self.api_url);
        let lookup: SignatureLookup = self
            .client
            .get(&url)
            .query(&[("hex_signature", selector)])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("malformed signature lookup response")?;

        // The directory lists newest submissions first; the oldest entry is
        // taken as the canonical one.
        Ok(lookup
            .results
            .last()
            .and_then(|record| record.text_signature.clone())
            .filter(|sig| !sig.is_empty()))
    }
}
