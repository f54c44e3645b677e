use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};

/// Offline mode. Every call fails, so recommendations come from keyword matching.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledLlmClient;

#[async_trait]
impl LlmClient for DisabledLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Disabled)
    }

    fn provider(&self) -> &'static str {
        "disabled"
    }
}
