// src/config.rs

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use url::Url;

pub const DEFAULT_TENDERLY_API_URL: &str = "https://api.tenderly.co/api/v1";
pub const DEFAULT_SIGNATURE_API_URL: &str = "https://www.4byte.directory";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Which text-generation backend produces the risk summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SummarizerBackend {
    #[default]
    OpenAi,
    Gemini,
}

impl FromStr for SummarizerBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(anyhow!(
                "unknown summarizer backend '{}', expected 'openai' or 'gemini'",
                other
            )),
        }
    }
}

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    /// RPC endpoints keyed by numeric network id, e.g.
    /// - Ethereum Mainnet (1)
    /// - Sepolia (11155111)
    /// - Polygon (137)
    /// - Arbitrum One (42161)
    /// - Base (8453)
    pub chain_rpc_urls: HashMap<String, String>,

    // Simulation provider
    pub tenderly_api_url: String,
    pub tenderly_account: Option<String>,
    pub tenderly_project: Option<String>,
    pub tenderly_api_key: Option<String>,

    // Function signature lookup
    pub signature_api_url: String,
    pub signature_timeout_secs: u64,

    // Summarizer
    pub summarizer_backend: SummarizerBackend,
    pub openai_api_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_max_retries: u32,
    pub openai_timeout_secs: u64,
    pub gemini_api_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            chain_rpc_urls: HashMap::new(),
            tenderly_api_url: DEFAULT_TENDERLY_API_URL.to_string(),
            tenderly_account: None,
            tenderly_project: None,
            tenderly_api_key: None,
            signature_api_url: DEFAULT_SIGNATURE_API_URL.to_string(),
            signature_timeout_secs: 10,
            summarizer_backend: SummarizerBackend::OpenAi,
            openai_api_url: DEFAULT_OPENAI_API_URL.to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_max_retries: 3,
            openai_timeout_secs: 30,
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }
}

impl Config {
    /// Returns a list of configured network ids
    pub fn supported_networks(&self) -> Vec<String> {
        self.chain_rpc_urls.keys().cloned().collect()
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let rpc_urls_str = env::var("CHAIN_RPC_URLS")
            .context("CHAIN_RPC_URLS must be set to a JSON map of network_id -> RPC URL")?;
        let chain_rpc_urls: HashMap<String, String> = serde_json::from_str(&rpc_urls_str)
            .context("Invalid CHAIN_RPC_URLS JSON format")?;

        let summarizer_backend = match env::var("SUMMARIZER_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => SummarizerBackend::default(),
        };

        Ok(Config {
            port: parse_var("PORT", 8080)?,
            chain_rpc_urls,

            tenderly_api_url: url_var("TENDERLY_API_URL", DEFAULT_TENDERLY_API_URL)?,
            tenderly_account: non_empty_var("TENDERLY_ACCOUNT"),
            tenderly_project: non_empty_var("TENDERLY_PROJECT"),
            tenderly_api_key: non_empty_var("TENDERLY_API_KEY"),

            signature_api_url: url_var("SIGNATURE_API_URL", DEFAULT_SIGNATURE_API_URL)?,
            signature_timeout_secs: parse_var("SIGNATURE_TIMEOUT_SECS", 10)?,

            summarizer_backend,
            openai_api_url: url_var("OPENAI_API_URL", DEFAULT_OPENAI_API_URL)?,
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            openai_max_retries: parse_var("OPENAI_MAX_RETRIES", 3)?,
            openai_timeout_secs: parse_var("OPENAI_TIMEOUT_SECS", 30)?,
            gemini_api_url: url_var("GEMINI_API_URL", DEFAULT_GEMINI_API_URL)?,
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

fn url_var(key: &str, default: &str) -> Result<String> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).with_context(|| format!("{} must be a valid URL", key))?;
    Ok(raw.trim_end_matches('/').to_string())
}
