// src/summarizer/openai.rs

use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{SummarizerError, TextGenerator};
use crate::config::Config;

const BACKEND: &str = "OpenAI";
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// Chat-completions client with a per-request timeout and bounded retries.
#[derive(Clone, Debug)]
pub struct OpenAiGenerator {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    max_retries: u32,
    timeout: Duration,
}

impl OpenAiGenerator {
    pub fn from_config(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.openai_api_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            max_retries: config.openai_max_retries,
            timeout: Duration::from_secs(config.openai_timeout_secs),
        }
    }

    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, SummarizerError> {
        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }]
        });
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SummarizerError::Api {
                backend: BACKEND,
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = resp.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(SummarizerError::EmptyResponse { backend: BACKEND })
    }
}

fn is_retryable(err: &SummarizerError) -> bool {
    match err {
        SummarizerError::Timeout => true,
        SummarizerError::Http(e) => e.is_connect() || e.is_request(),
        SummarizerError::Api { status, .. } => {
            matches!(status, 408 | 409 | 429) || *status >= 500
        }
        _ => false,
    }
}

/// Retry schedule: 500ms doubling up to 8s. The retry count, not elapsed
/// time, bounds the attempts.
fn retry_policy() -> ExponentialBackoff {
    let mut policy = ExponentialBackoff::default();
    policy.initial_interval = INITIAL_BACKOFF;
    policy.multiplier = 2.0;
    policy.max_interval = MAX_BACKOFF;
    policy.max_elapsed_time = None;
    policy.reset();
    policy
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, SummarizerError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SummarizerError::MissingApiKey { backend: BACKEND })?;

        let max_retries = self.max_retries;
        let mut attempt = 0u32;
        let operation = || {
            let current = attempt;
            attempt += 1;
            async move {
                match self.complete(api_key, prompt).await {
                    Ok(text) => {
                        debug!("{} completion received after {} retries", self.model, current);
                        Ok(text)
                    }
                    Err(e) if current < max_retries && is_retryable(&e) => {
                        warn!(
                            "{} request failed ({}), retry {}/{}",
                            BACKEND,
                            e,
                            current + 1,
                            max_retries
                        );
                        Err(backoff::Error::transient(e))
                    }
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            }
        };

        backoff::future::retry(retry_policy(), operation).await
    }
}
