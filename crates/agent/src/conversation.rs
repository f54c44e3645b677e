use std::sync::Arc;

use pillsprint_core::catalog::{CatalogAccessor, CatalogFilter};
use pillsprint_core::domain::medicine::MedicineRecord;

use crate::llm::{ChatTurn, LlmClient};
use crate::prompt::chat_prompt;

pub const CHAT_UNAVAILABLE: &str = "I'm sorry, I'm having trouble connecting to the AI service right now. Please try again later, or browse our available medicines directly.";

/// Inventory counts quoted to the model so it can speak about the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    pub total: usize,
    pub emergency: usize,
    pub pain_relief: usize,
    pub vitamins: usize,
    pub digestive: usize,
    pub allergy: usize,
}

impl CatalogSummary {
    pub fn from_records(records: &[MedicineRecord]) -> Self {
        let in_category =
            |category: &str| records.iter().filter(|record| record.category == category).count();
        Self {
            total: records.len(),
            emergency: records.iter().filter(|record| record.emergency).count(),
            pain_relief: in_category("Pain Relief"),
            vitamins: in_category("Vitamins"),
            digestive: in_category("Digestive"),
            allergy: in_category("Allergy"),
        }
    }
}

/// Free-form pharmacy assistant chat. Never fails: every error turns into
/// [`CHAT_UNAVAILABLE`].
#[derive(Clone)]
pub struct MedicalChat {
    llm: Arc<dyn LlmClient>,
    catalog: Arc<dyn CatalogAccessor>,
}

impl MedicalChat {
    pub fn new(llm: Arc<dyn LlmClient>, catalog: Arc<dyn CatalogAccessor>) -> Self {
        Self { llm, catalog }
    }

    pub async fn reply(&self, message: &str, history: &[ChatTurn]) -> String {
        let records = match self.catalog.list_all(&CatalogFilter::new()).await {
            Ok(records) => records,
            Err(error) => {
                tracing::error!(
                    event_name = "chat.catalog_failed",
                    error = %error,
                    "could not load catalog for chat"
                );
                return CHAT_UNAVAILABLE.to_string();
            }
        };

        let prompt = chat_prompt(message, &CatalogSummary::from_records(&records));
        match self.llm.chat(history, &prompt).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(
                    event_name = "chat.failed",
                    provider = self.llm.provider(),
                    history_turns = history.len(),
                    error = %error,
                    "chat completion failed"
                );
                CHAT_UNAVAILABLE.to_string()
            }
        }
    }
}
