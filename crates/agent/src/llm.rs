use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "assistant")]
    Model,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Model, content: content.into() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("could not reach {provider} at {endpoint}")]
    Connection { provider: &'static str, endpoint: String },
    #[error("{provider} request timed out after {after_secs}s")]
    Timeout { provider: &'static str, after_secs: u64 },
    #[error("{provider} returned HTTP {status}: {body}")]
    Status { provider: &'static str, status: u16, body: String },
    #[error("could not decode {provider} response: {message}")]
    Decode { provider: &'static str, message: String },
    #[error("{provider} returned an empty completion")]
    EmptyCompletion { provider: &'static str },
    #[error("{provider} transport error: {message}")]
    Transport { provider: &'static str, message: String },
    #[error("generative text provider is disabled")]
    Disabled,
}

/// Single-shot text generation. Implementations do not retry.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Continues a conversation. Providers without native multi-turn support
    /// get the history flattened into the prompt.
    async fn chat(&self, history: &[ChatTurn], prompt: &str) -> Result<String, LlmError> {
        if history.is_empty() {
            return self.complete(prompt).await;
        }
        self.complete(&flatten_history(history, prompt)).await
    }

    fn provider(&self) -> &'static str;
}

pub fn flatten_history(history: &[ChatTurn], prompt: &str) -> String {
    let mut flattened = String::from("Conversation so far:\n");
    for turn in history {
        let speaker = match turn.role {
            ChatRole::User => "User",
            ChatRole::Model => "Assistant",
        };
        flattened.push_str(speaker);
        flattened.push_str(": ");
        flattened.push_str(turn.content.trim());
        flattened.push('\n');
    }
    flattened.push('\n');
    flattened.push_str(prompt);
    flattened
}
