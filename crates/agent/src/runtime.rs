use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use pillsprint_core::catalog::CatalogAccessor;
use pillsprint_core::config::AppConfig;
use pillsprint_core::domain::medicine::{MedicineId, MedicineRecord};
use pillsprint_core::domain::recommendation::Recommendation;
use pillsprint_core::errors::CatalogError;
use pillsprint_core::matching::KeywordMatcher;

use crate::conversation::MedicalChat;
use crate::guardrails::ResponsePolicy;
use crate::insights::{CompositionAnalysis, InsightOutcome, InsightService, PriceComparison};
use crate::llm::{ChatTurn, LlmClient};
use crate::orchestrator::RecommendationOrchestrator;
use crate::providers::build_llm_client;
use crate::recommender::AiRecommender;

/// Everything a caller needs, wired to one catalog and one model client.
///
/// Recommendation, insight and chat calls never fail. Catalog browsing calls
/// (`search`, `get_by_id`, `list_emergency`) return [`CatalogError`] so the
/// caller can offer a retry.
#[derive(Clone)]
pub struct AgentRuntime {
    catalog: Arc<dyn CatalogAccessor>,
    orchestrator: RecommendationOrchestrator,
    insights: InsightService,
    chat: MedicalChat,
}

impl AgentRuntime {
    pub fn new(
        catalog: Arc<dyn CatalogAccessor>,
        llm: Arc<dyn LlmClient>,
        orchestrator: RecommendationOrchestrator,
    ) -> Self {
        Self {
            insights: InsightService::new(llm.clone(), catalog.clone()),
            chat: MedicalChat::new(llm, catalog.clone()),
            catalog,
            orchestrator,
        }
    }

    /// Builds the model client and matcher from configuration.
    pub fn from_config(config: &AppConfig, catalog: Arc<dyn CatalogAccessor>) -> Result<Self> {
        let llm = build_llm_client(&config.llm)?;
        Self::from_parts(config, catalog, llm)
    }

    /// Same as [`AgentRuntime::from_config`] with an externally supplied model client.
    pub fn from_parts(
        config: &AppConfig,
        catalog: Arc<dyn CatalogAccessor>,
        llm: Arc<dyn LlmClient>,
    ) -> Result<Self> {
        let matcher = KeywordMatcher::new(
            config.matching.rule_table()?,
            config.matching.default_categories.clone(),
        )
        .with_max_items(config.recommendation.fallback_items);
        let orchestrator = RecommendationOrchestrator::new(
            catalog.clone(),
            AiRecommender::new(llm.clone()),
            matcher,
        )
        .with_policy(ResponsePolicy::new(config.recommendation.max_items))
        .with_ai_timeout(Duration::from_secs(config.recommendation.ai_timeout_secs));

        tracing::debug!(
            event_name = "agent.runtime.ready",
            provider = llm.provider(),
            rules = orchestrator.matcher().rules().len(),
            "agent runtime configured"
        );
        Ok(Self::new(catalog, llm, orchestrator))
    }

    pub async fn get_recommendations(&self, symptoms: &str) -> Recommendation {
        self.orchestrator.get_recommendations(symptoms).await
    }

    pub async fn analyze_composition(
        &self,
        composition: &str,
        condition: Option<&str>,
    ) -> InsightOutcome<CompositionAnalysis> {
        self.insights.analyze_composition(composition, condition).await
    }

    pub async fn compare_options(
        &self,
        medicine_name: &str,
        composition: Option<&str>,
    ) -> InsightOutcome<PriceComparison> {
        self.insights.compare_options(medicine_name, composition).await
    }

    pub async fn medical_chat(&self, message: &str, history: &[ChatTurn]) -> String {
        self.chat.reply(message, history).await
    }

    pub async fn search(&self, text: &str) -> Result<Vec<MedicineRecord>, CatalogError> {
        self.catalog.search(text).await
    }

    pub async fn get_by_id(&self, id: &MedicineId) -> Result<MedicineRecord, CatalogError> {
        self.catalog.get_by_id(id).await
    }

    pub async fn list_emergency(&self) -> Result<Vec<MedicineRecord>, CatalogError> {
        self.catalog.list_emergency().await
    }
}
