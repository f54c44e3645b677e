//! `get_recommendations`: the model-backed path with the keyword matcher
//! behind it.
//!
//! ```text
//! Start -> AttemptAI -> Success -----------------> Normalize -> Done
//!                    -> Failure -> AttemptFallback -> Normalize -> Done
//! ```
//!
//! The catalog snapshot is fetched once per call and shared by both paths.
//! Nothing is retried and nothing is kept between calls.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use pillsprint_core::catalog::{CatalogAccessor, CatalogFilter};
use pillsprint_core::domain::medicine::MedicineRecord;
use pillsprint_core::domain::recommendation::Recommendation;
use pillsprint_core::errors::RecommendationError;
use pillsprint_core::matching::KeywordMatcher;

use crate::guardrails::ResponsePolicy;
use crate::recommender::AiRecommender;

pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(12);

#[derive(Clone)]
pub struct RecommendationOrchestrator {
    catalog: Arc<dyn CatalogAccessor>,
    ai: AiRecommender,
    matcher: KeywordMatcher,
    policy: ResponsePolicy,
    ai_timeout: Duration,
}

impl RecommendationOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogAccessor>,
        ai: AiRecommender,
        matcher: KeywordMatcher,
    ) -> Self {
        Self {
            catalog,
            ai,
            matcher,
            policy: ResponsePolicy::default(),
            ai_timeout: DEFAULT_AI_TIMEOUT,
        }
    }

    pub fn with_policy(mut self, policy: ResponsePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_ai_timeout(mut self, ai_timeout: Duration) -> Self {
        self.ai_timeout = ai_timeout;
        self
    }

    pub fn matcher(&self) -> &KeywordMatcher {
        &self.matcher
    }

    /// Always returns a usable recommendation. Blank input is answered with a
    /// request to rephrase and touches neither the catalog nor the model.
    pub async fn get_recommendations(&self, symptoms: &str) -> Recommendation {
        if symptoms.trim().is_empty() {
            tracing::debug!(event_name = "recommendation.blank_input", "asking caller to rephrase");
            return Recommendation::rephrase();
        }

        let correlation_id = Uuid::new_v4();
        let (snapshot, attempt) = match self.catalog.list_all(&CatalogFilter::new()).await {
            Ok(snapshot) => {
                let attempt = self.attempt_ai(symptoms, &snapshot, correlation_id).await;
                (snapshot, attempt)
            }
            Err(error) => {
                tracing::error!(
                    event_name = "recommendation.catalog.failed",
                    correlation_id = %correlation_id,
                    error = %error,
                    "catalog snapshot unavailable, skipping model"
                );
                (Vec::new(), Err(RecommendationError::from(error)))
            }
        };

        let recommendation = match attempt {
            Ok(recommendation) => recommendation,
            Err(error) => {
                tracing::warn!(
                    event_name = "recommendation.ai.failed",
                    correlation_id = %correlation_id,
                    kind = error.kind(),
                    error = %error,
                    "model path unusable, falling back to keyword matching"
                );
                let fallback =
                    self.matcher.recommend(symptoms, &snapshot, self.catalog.as_ref()).await;
                tracing::info!(
                    event_name = "recommendation.fallback.used",
                    correlation_id = %correlation_id,
                    items = fallback.items.len(),
                    "keyword fallback produced recommendation"
                );
                fallback
            }
        };

        self.policy.normalize(recommendation, symptoms, self.matcher.signals_urgency(symptoms))
    }

    async fn attempt_ai(
        &self,
        symptoms: &str,
        snapshot: &[MedicineRecord],
        correlation_id: Uuid,
    ) -> Result<Recommendation, RecommendationError> {
        tracing::info!(
            event_name = "recommendation.ai.attempt",
            correlation_id = %correlation_id,
            provider = self.ai.provider(),
            catalog_size = snapshot.len(),
            "requesting model recommendation"
        );

        let recommendation =
            tokio::time::timeout(self.ai_timeout, self.ai.recommend(symptoms, snapshot))
                .await
                .map_err(|_| RecommendationError::Timeout {
                    after_secs: self.ai_timeout.as_secs(),
                })??;

        tracing::info!(
            event_name = "recommendation.ai.succeeded",
            correlation_id = %correlation_id,
            items = recommendation.items.len(),
            "model recommendation accepted"
        );
        Ok(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rust_decimal::Decimal;

    use pillsprint_core::catalog::CatalogAccessor;
    use pillsprint_core::domain::medicine::MedicineRow;
    use pillsprint_core::domain::recommendation::{DEFAULT_DISCLAIMER, REPHRASE_ANALYSIS};
    use pillsprint_core::matching::KeywordMatcher;
    use pillsprint_db::InMemoryCatalog;

    use super::RecommendationOrchestrator;
    use crate::llm::LlmClient;
    use crate::recommender::AiRecommender;
    use crate::test_support::{FailingCatalog, FailingLlm, ScriptedLlm, SlowLlm};

    fn row(id: &str, category: &str, stock: i64, emergency: bool) -> MedicineRow {
        let mut row = MedicineRow::new(id, format!("Medicine {id}"), category, Decimal::ONE);
        row.stock = Some(stock);
        row.emergency = Some(emergency);
        row
    }

    fn two_item_catalog() -> Arc<InMemoryCatalog> {
        Arc::new(InMemoryCatalog::from_rows([
            row("m1", "Pain Relief", 10, false),
            row("m2", "Emergency", 5, true),
        ]))
    }

    fn orchestrator(
        catalog: Arc<dyn CatalogAccessor>,
        llm: Arc<dyn LlmClient>,
    ) -> RecommendationOrchestrator {
        RecommendationOrchestrator::new(catalog, AiRecommender::new(llm), KeywordMatcher::default())
    }

    #[tokio::test]
    async fn blank_input_touches_nothing() {
        let catalog = Arc::new(FailingCatalog::default());
        let llm = Arc::new(ScriptedLlm::new("{}"));
        let orchestrator = orchestrator(catalog.clone(), llm.clone());

        for input in ["", "   ", "\n\t"] {
            let recommendation = orchestrator.get_recommendations(input).await;
            assert!(recommendation.items.is_empty());
            assert_eq!(recommendation.analysis, REPHRASE_ANALYSIS);
        }
        assert_eq!(catalog.calls(), 0);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn failing_catalog_and_model_still_yield_structured_result() {
        let orchestrator =
            orchestrator(Arc::new(FailingCatalog::default()), Arc::new(FailingLlm));

        for input in ["fever", "chest pain", "???", "a".repeat(2_000).as_str()] {
            let recommendation = orchestrator.get_recommendations(input).await;
            assert!(recommendation.is_fallback);
            assert!(recommendation.items.is_empty());
            assert!(!recommendation.disclaimer.is_empty());
            assert!(!recommendation.analysis.is_empty());
        }
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_keyword_matching() {
        let orchestrator = orchestrator(two_item_catalog(), Arc::new(FailingLlm));

        let recommendation = orchestrator.get_recommendations("I have a severe headache").await;

        assert!(recommendation.is_fallback);
        let ids: Vec<&str> =
            recommendation.items.iter().map(|item| item.medicine_id.as_str()).collect();
        assert!(ids.contains(&"m1"));
        assert_eq!(ids[0], "m2", "emergency items rank first");
        assert!(recommendation.emergency_note.is_some());
    }

    #[tokio::test]
    async fn empty_catalog_yields_empty_fallback() {
        let llm = Arc::new(ScriptedLlm::new("{}"));
        let orchestrator = orchestrator(Arc::new(InMemoryCatalog::default()), llm.clone());

        let recommendation = orchestrator.get_recommendations("fever").await;

        assert!(recommendation.is_fallback);
        assert!(recommendation.items.is_empty());
        assert_eq!(recommendation.disclaimer, DEFAULT_DISCLAIMER);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn valid_model_reply_is_returned_as_is() {
        let llm = Arc::new(ScriptedLlm::new(
            r#"```json
{"analysis": "Likely tension headache", "recommendations": [{"id": "m1", "reason": "Pain relief"}],
 "disclaimer": "Consult a doctor"}
```"#,
        ));
        let orchestrator = orchestrator(two_item_catalog(), llm);

        let recommendation = orchestrator.get_recommendations("headache").await;

        assert!(!recommendation.is_fallback);
        assert_eq!(recommendation.analysis, "Likely tension headache");
        let ids: Vec<&str> =
            recommendation.items.iter().map(|item| item.medicine_id.as_str()).collect();
        assert_eq!(ids, vec!["m1"]);
        assert_eq!(recommendation.items[0].reason, "Pain relief");
        assert_eq!(recommendation.disclaimer, "Consult a doctor");
        assert_eq!(recommendation.emergency_note, None);
    }

    #[tokio::test]
    async fn malformed_model_reply_falls_back() {
        let llm = Arc::new(ScriptedLlm::new(
            r#"{"analysis": "Possible flu", "recommendations": [{"id": "m1""#,
        ));
        let orchestrator = orchestrator(two_item_catalog(), llm);

        let recommendation = orchestrator.get_recommendations("fever and headache").await;

        assert!(recommendation.is_fallback);
        assert!(!recommendation.items.is_empty());
        assert!(recommendation.analysis.contains("fever and headache"));
    }

    #[tokio::test]
    async fn slow_model_times_out_into_fallback() {
        let llm = Arc::new(SlowLlm {
            delay: Duration::from_millis(500),
            reply: r#"{"recommendations": [{"id": "m1"}]}"#.to_string(),
        });
        let orchestrator = orchestrator(two_item_catalog(), llm)
            .with_ai_timeout(Duration::from_millis(20));

        let recommendation = orchestrator.get_recommendations("headache").await;

        assert!(recommendation.is_fallback);
    }

    #[tokio::test]
    async fn fallback_is_capped() {
        let catalog = Arc::new(InMemoryCatalog::from_rows(
            (0..9).map(|index| row(&format!("p{index}"), "Pain Relief", 3, false)),
        ));
        let orchestrator = orchestrator(catalog, Arc::new(FailingLlm));

        let recommendation = orchestrator.get_recommendations("back pain").await;

        assert_eq!(recommendation.items.len(), 4);
    }
}
