use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, send_error};
use crate::llm::{LlmClient, LlmError};

const PROVIDER: &str = "ollama";

/// Local Ollama instance, non-streaming `/api/generate`.
pub struct OllamaClient {
    base_url: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout_secs,
            client: http_client(PROVIDER, timeout_secs)?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest { model: &self.model, prompt, stream: false };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|error| send_error(PROVIDER, &self.base_url, self.timeout_secs, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { provider: PROVIDER, status: status.as_u16(), body });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|error| LlmError::Decode { provider: PROVIDER, message: error.to_string() })?;

        if parsed.response.trim().is_empty() {
            return Err(LlmError::EmptyCompletion { provider: PROVIDER });
        }
        Ok(parsed.response)
    }

    fn provider(&self) -> &'static str {
        PROVIDER
    }
}
