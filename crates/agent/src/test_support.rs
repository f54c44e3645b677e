//! Scripted doubles shared by the unit tests in this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use pillsprint_core::catalog::{CatalogAccessor, CatalogFilter};
use pillsprint_core::domain::medicine::{MedicineId, MedicineRecord};
use pillsprint_core::errors::CatalogError;

use crate::llm::{ChatTurn, LlmClient, LlmError};

/// Replies with the same text every time and records what it was asked.
pub struct ScriptedLlm {
    reply: String,
    prompts: Mutex<Vec<String>>,
    histories: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), prompts: Mutex::default(), histories: Mutex::default() }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().expect("prompts lock").len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }

    pub fn histories(&self) -> Vec<Vec<ChatTurn>> {
        self.histories.lock().expect("histories lock").clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().expect("prompts lock").push(prompt.to_string());
        Ok(self.reply.clone())
    }

    async fn chat(&self, history: &[ChatTurn], prompt: &str) -> Result<String, LlmError> {
        self.histories.lock().expect("histories lock").push(history.to_vec());
        self.complete(prompt).await
    }

    fn provider(&self) -> &'static str {
        "scripted"
    }
}

pub struct FailingLlm;

#[async_trait]
impl LlmClient for FailingLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Connection { provider: "failing", endpoint: "http://127.0.0.1:9".into() })
    }

    fn provider(&self) -> &'static str {
        "failing"
    }
}

/// Sleeps before replying, for timeout tests.
pub struct SlowLlm {
    pub delay: Duration,
    pub reply: String,
}

#[async_trait]
impl LlmClient for SlowLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }

    fn provider(&self) -> &'static str {
        "slow"
    }
}

/// Every call fails with a store error. Counts how often it was touched.
#[derive(Default)]
pub struct FailingCatalog {
    calls: AtomicUsize,
}

impl FailingCatalog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CatalogError::store("connection refused").with_code("08006"))
    }
}

#[async_trait]
impl CatalogAccessor for FailingCatalog {
    async fn list_all(
        &self,
        _filters: &CatalogFilter,
    ) -> Result<Vec<MedicineRecord>, CatalogError> {
        self.fail()
    }

    async fn get_by_id(&self, _id: &MedicineId) -> Result<MedicineRecord, CatalogError> {
        self.fail()
    }

    async fn search(&self, _text: &str) -> Result<Vec<MedicineRecord>, CatalogError> {
        self.fail()
    }
}
