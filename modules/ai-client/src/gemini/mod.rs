mod client;
pub(crate) mod types;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::error::AiError;
use crate::traits::{TextCompletion, CALL_FAILED_REPLY};

use client::GeminiClient;
use types::GenerateContentRequest;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Gemini
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    timeout: Duration,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> Result<GeminiClient> {
        let client = GeminiClient::new(&self.api_key, self.timeout)?;
        Ok(match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        })
    }

    /// Single-turn generation with deterministic sampling.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest::new()
            .user(prompt)
            .temperature(0.0)
            .max_output_tokens(2048);

        let response = self.client()?.generate(&self.model, &request).await?;

        response.text().ok_or_else(|| AiError::EmptyResponse.into())
    }
}

#[async_trait]
impl TextCompletion for Gemini {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self.generate(prompt).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(model = %self.model, error = %e, "Gemini call failed");
                Ok(CALL_FAILED_REPLY.to_string())
            }
        }
    }
}
