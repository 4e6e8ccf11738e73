// src/summarizer/gemini.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{SummarizerError, TextGenerator};
use crate::config::Config;

const BACKEND: &str = "Gemini";

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// `generateContent` client. No retry or timeout of its own; failures are
/// returned unchanged.
#[derive(Clone, Debug)]
pub struct GeminiGenerator {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiGenerator {
    pub fn from_config(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.gemini_api_url.clone(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, SummarizerError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SummarizerError::MissingApiKey { backend: BACKEND })?;

        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let resp = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
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

        let generated: GenerateContentResponse = resp.json().await?;
        let text: String = generated
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(SummarizerError::EmptyResponse { backend: BACKEND });
        }
        Ok(text)
    }
}
