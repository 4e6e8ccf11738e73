// src/summarizer/fail_soft.rs

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, warn};

use super::{SummarizerError, TextGenerator};

pub const TIMED_OUT_MESSAGE: &str = "Analysis timed out. Please try again.";
pub const FAILED_MESSAGE: &str = "Error analyzing transaction.";

/// Never lets a generator error reach the caller: timeouts become
/// [`TIMED_OUT_MESSAGE`], anything else [`FAILED_MESSAGE`].
pub struct FailSoft<G> {
    inner: G,
    timeout: Option<Duration>,
}

impl<G: TextGenerator> FailSoft<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            timeout: None,
        }
    }

    /// Adds an overall deadline for backends without their own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for FailSoft<G> {
    async fn generate(&self, prompt: &str) -> Result<String, SummarizerError> {
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.inner.generate(prompt)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SummarizerError::Timeout),
            },
            None => self.inner.generate(prompt).await,
        };

        match outcome {
            Ok(text) => Ok(text),
            Err(e) if e.is_timeout() => {
                warn!("Summary generation timed out");
                Ok(TIMED_OUT_MESSAGE.to_string())
            }
            Err(e) => {
                error!("Summary generation failed: {}", e);
                Ok(FAILED_MESSAGE.to_string())
            }
        }
    }
}
