use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use pillsprint_core::domain::medicine::MedicineRecord;
use pillsprint_core::domain::recommendation::{
    Recommendation, RecommendationItem, DEFAULT_DISCLAIMER,
};
use pillsprint_core::errors::RecommendationError;
use pillsprint_core::matching::templates;

use crate::llm::LlmClient;
use crate::parse::{lenient_text, parse_reply, ModelReply};
use crate::prompt::recommendation_prompt;

/// Top-level shape requested from the model. `recommendations` stays untyped so
/// one malformed entry does not sink the whole reply.
#[derive(Debug, Deserialize)]
struct ModelRecommendation {
    #[serde(default, deserialize_with = "lenient_text")]
    analysis: Option<String>,
    #[serde(default)]
    recommendations: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    emergency_note: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    general_advice: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    disclaimer: Option<String>,
}

/// Only the justification text is taken from the model. Name, category, form
/// and price always come from the catalog record.
#[derive(Debug, Deserialize)]
struct ModelItem {
    #[serde(default, deserialize_with = "lenient_text")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    how_it_helps: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    usage: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    precautions: Option<String>,
}

/// Asks the model to pick medicines from a catalog snapshot.
#[derive(Clone)]
pub struct AiRecommender {
    llm: Arc<dyn LlmClient>,
}

impl AiRecommender {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub fn provider(&self) -> &'static str {
        self.llm.provider()
    }

    /// One model call, no retry.
    pub async fn recommend(
        &self,
        symptoms: &str,
        snapshot: &[MedicineRecord],
    ) -> Result<Recommendation, RecommendationError> {
        if snapshot.is_empty() {
            return Err(RecommendationError::EmptyCatalog);
        }

        let prompt = recommendation_prompt(symptoms, snapshot);
        let raw = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|error| RecommendationError::Llm(error.to_string()))?;

        interpret_reply(symptoms, &raw, snapshot)
    }
}

/// Validates a raw model reply against the snapshot it was prompted with.
pub fn interpret_reply(
    symptoms: &str,
    raw: &str,
    snapshot: &[MedicineRecord],
) -> Result<Recommendation, RecommendationError> {
    let value = match parse_reply::<Value>(raw) {
        ModelReply::Structured(value) => value,
        ModelReply::Unparseable { error, .. } => {
            return Err(RecommendationError::parse(format!("invalid JSON: {error}"), raw));
        }
    };
    if !value.is_object() {
        return Err(RecommendationError::parse("reply is not a JSON object", raw));
    }

    let reply: ModelRecommendation = serde_json::from_value(value)
        .map_err(|error| RecommendationError::parse(error.to_string(), raw))?;
    let Some(Value::Array(entries)) = reply.recommendations else {
        return Err(RecommendationError::parse("`recommendations` is missing or not a list", raw));
    };

    let by_id: HashMap<&str, &MedicineRecord> =
        snapshot.iter().map(|record| (record.id.as_str(), record)).collect();
    let lowered = symptoms.to_lowercase();
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for entry in entries.iter().cloned() {
        let Ok(item) = serde_json::from_value::<ModelItem>(entry) else {
            continue;
        };
        let Some(record) = item.id.as_deref().and_then(|id| by_id.get(id).copied()) else {
            tracing::debug!(
                event_name = "recommendation.ai.unknown_id",
                medicine_id = item.id.as_deref().unwrap_or_default(),
                "dropping model pick that is not in the catalog"
            );
            continue;
        };
        if !seen.insert(record.id.clone()) {
            continue;
        }

        items.push(RecommendationItem::from_record(
            record,
            item.reason.unwrap_or_else(|| templates::reason_for(&lowered, record)),
            item.how_it_helps.unwrap_or_else(|| templates::how_it_helps(record)),
            item.usage.unwrap_or_else(|| templates::usage_for(record)),
            item.precautions.unwrap_or_else(|| templates::precautions_for(record)),
        ));
    }

    if items.is_empty() {
        return Err(RecommendationError::parse("no recommended id exists in the catalog", raw));
    }

    Ok(Recommendation {
        analysis: reply.analysis.unwrap_or_else(|| templates::fallback_analysis(symptoms)),
        items,
        emergency_note: reply.emergency_note,
        general_advice: reply.general_advice,
        disclaimer: reply.disclaimer.unwrap_or_else(|| DEFAULT_DISCLAIMER.to_string()),
        is_fallback: false,
    })
}
