//! Generative text providers and the factory that picks one from configuration.

pub mod disabled;
pub mod gemini;
pub mod ollama;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use pillsprint_core::config::{LlmConfig, LlmProvider};

use crate::llm::{LlmClient, LlmError};

pub use disabled::DisabledLlmClient;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::Gemini => {
            let api_key = config
                .api_key
                .clone()
                .context("llm.api_key is required for the gemini provider")?;
            Arc::new(
                GeminiClient::new(
                    &config.resolved_base_url(),
                    &config.resolved_model(),
                    api_key,
                    config.timeout_secs,
                )
                .context("failed to build gemini client")?
                .with_max_output_tokens(config.max_output_tokens),
            )
        }
        LlmProvider::Ollama => Arc::new(
            OllamaClient::new(
                &config.resolved_base_url(),
                &config.resolved_model(),
                config.timeout_secs,
            )
            .context("failed to build ollama client")?,
        ),
        LlmProvider::Disabled => Arc::new(DisabledLlmClient),
    };

    tracing::debug!(
        event_name = "llm.client.built",
        provider = client.provider(),
        "generative text client ready"
    );
    Ok(client)
}

pub(crate) fn http_client(
    provider: &'static str,
    timeout_secs: u64,
) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|error| LlmError::Transport { provider, message: error.to_string() })
}

/// Maps a send failure the same way for every HTTP provider.
pub(crate) fn send_error(
    provider: &'static str,
    endpoint: &str,
    timeout_secs: u64,
    error: reqwest::Error,
) -> LlmError {
    if error.is_connect() {
        LlmError::Connection { provider, endpoint: endpoint.to_string() }
    } else if error.is_timeout() {
        LlmError::Timeout { provider, after_secs: timeout_secs }
    } else {
        LlmError::Transport { provider, message: error.to_string() }
    }
}
