//! Composition analysis and price comparison.
//!
//! Both are single model calls with no deterministic fallback: a reply that
//! cannot be decoded is returned as [`InsightOutcome::Unparseable`] with the raw
//! text, and any failure before that as [`InsightOutcome::Failed`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use pillsprint_core::catalog::{CatalogAccessor, CatalogFilter};
use pillsprint_core::domain::medicine::MedicineRecord;

use crate::llm::LlmClient;
use crate::parse::{lenient_list, lenient_text, parse_reply, ModelReply};
use crate::prompt::{comparison_prompt, composition_prompt};

pub const COMPOSITION_PARSE_FAILED: &str = "Failed to parse composition analysis";
pub const COMPOSITION_FAILED: &str = "Failed to analyze composition";
pub const COMPARISON_PARSE_FAILED: &str = "Failed to parse medicine comparison";
pub const COMPARISON_FAILED: &str = "Failed to compare medicine options";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsightOutcome<T> {
    Structured { value: T },
    Unparseable { error: String, raw_response: String },
    Failed { error: String, message: String },
}

impl<T> InsightOutcome<T> {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured { .. })
    }

    fn failed(error: &str, message: impl Into<String>) -> Self {
        Self::Failed { error: error.to_string(), message: message.into() }
    }

    fn from_reply(reply: ModelReply<T>, parse_error: &str) -> Self {
        match reply {
            ModelReply::Structured(value) => Self::Structured { value },
            ModelReply::Unparseable { raw, .. } => {
                Self::Unparseable { error: parse_error.to_string(), raw_response: raw }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub purpose: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IngredientRepr {
    Named(String),
    Detailed {
        #[serde(alias = "ingredient")]
        name: String,
        #[serde(default, alias = "role", deserialize_with = "lenient_text")]
        purpose: Option<String>,
    },
}

impl From<IngredientRepr> for Ingredient {
    fn from(repr: IngredientRepr) -> Self {
        match repr {
            IngredientRepr::Named(name) => Self { name, purpose: None },
            IngredientRepr::Detailed { name, purpose } => Self { name, purpose },
        }
    }
}

fn ingredients<'de, D>(deserializer: D) -> Result<Vec<Ingredient>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let reprs = Option::<Vec<IngredientRepr>>::deserialize(deserializer)?;
    Ok(reprs.unwrap_or_default().into_iter().map(Ingredient::from).collect())
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionAnalysis {
    #[serde(default, alias = "active_ingredients", deserialize_with = "ingredients")]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub benefits: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub side_effects: Vec<String>,
    #[serde(default, alias = "contraindications", deserialize_with = "lenient_list")]
    pub warnings: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub suitability: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedOption {
    pub name: String,
    pub price: Option<String>,
    pub manufacturer: Option<String>,
    pub note: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PricedOptionRepr {
    Named(String),
    Detailed {
        name: String,
        #[serde(default, deserialize_with = "lenient_text")]
        price: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        manufacturer: Option<String>,
        #[serde(default, alias = "reason", deserialize_with = "lenient_text")]
        note: Option<String>,
    },
}

impl From<PricedOptionRepr> for PricedOption {
    fn from(repr: PricedOptionRepr) -> Self {
        match repr {
            PricedOptionRepr::Named(name) => {
                Self { name, price: None, manufacturer: None, note: None }
            }
            PricedOptionRepr::Detailed { name, price, manufacturer, note } => {
                Self { name, price, manufacturer, note }
            }
        }
    }
}

fn priced_options<'de, D>(deserializer: D) -> Result<Vec<PricedOption>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let reprs = Option::<Vec<PricedOptionRepr>>::deserialize(deserializer)?;
    Ok(reprs.unwrap_or_default().into_iter().map(PricedOption::from).collect())
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceComparison {
    #[serde(default, deserialize_with = "lenient_text")]
    pub estimated_price_range: Option<String>,
    #[serde(default, deserialize_with = "priced_options")]
    pub alternatives: Vec<PricedOption>,
    #[serde(default, alias = "generic_alternatives", deserialize_with = "priced_options")]
    pub generic_options: Vec<PricedOption>,
    #[serde(default, alias = "price_comparison", deserialize_with = "lenient_text")]
    pub summary: Option<String>,
}

/// Catalog entries named like `query`, plus everything sharing the category of
/// the first such entry.
pub fn similar_medicines<'a>(
    query: &str,
    catalog: &'a [MedicineRecord],
) -> Vec<&'a MedicineRecord> {
    let needle = query.trim().to_lowercase();
    let named = |record: &MedicineRecord| record.name.to_lowercase().contains(&needle);
    let anchor_category =
        catalog.iter().find(|record| named(*record)).map(|record| &record.category);

    catalog
        .iter()
        .filter(|record| named(*record) || Some(&record.category) == anchor_category)
        .collect()
}

#[derive(Clone)]
pub struct InsightService {
    llm: Arc<dyn LlmClient>,
    catalog: Arc<dyn CatalogAccessor>,
}

impl InsightService {
    pub fn new(llm: Arc<dyn LlmClient>, catalog: Arc<dyn CatalogAccessor>) -> Self {
        Self { llm, catalog }
    }

    pub async fn analyze_composition(
        &self,
        composition: &str,
        condition: Option<&str>,
    ) -> InsightOutcome<CompositionAnalysis> {
        if composition.trim().is_empty() {
            return InsightOutcome::failed(COMPOSITION_FAILED, "composition text is empty");
        }
        let condition = condition.filter(|condition| !condition.trim().is_empty());

        let prompt = composition_prompt(composition, condition);
        match self.llm.complete(&prompt).await {
            Ok(raw) => {
                let outcome =
                    InsightOutcome::from_reply(parse_reply(&raw), COMPOSITION_PARSE_FAILED);
                if !outcome.is_structured() {
                    tracing::warn!(
                        event_name = "insight.composition.unparseable",
                        provider = self.llm.provider(),
                        "composition analysis reply was not valid JSON"
                    );
                }
                outcome
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "insight.composition.failed",
                    provider = self.llm.provider(),
                    error = %error,
                    "composition analysis failed"
                );
                InsightOutcome::failed(COMPOSITION_FAILED, error.to_string())
            }
        }
    }

    pub async fn compare_options(
        &self,
        medicine_name: &str,
        composition: Option<&str>,
    ) -> InsightOutcome<PriceComparison> {
        if medicine_name.trim().is_empty() {
            return InsightOutcome::failed(COMPARISON_FAILED, "medicine name is empty");
        }

        let catalog = match self.catalog.list_all(&CatalogFilter::new()).await {
            Ok(catalog) => catalog,
            Err(error) => {
                tracing::error!(
                    event_name = "insight.comparison.catalog_failed",
                    error = %error,
                    "could not load catalog for comparison"
                );
                return InsightOutcome::failed(COMPARISON_FAILED, error.to_string());
            }
        };
        let similar = similar_medicines(medicine_name, &catalog);
        let composition = composition.filter(|composition| !composition.trim().is_empty());

        tracing::debug!(
            event_name = "insight.comparison.attempt",
            similar = similar.len(),
            "comparing medicine options"
        );

        let prompt = comparison_prompt(medicine_name, composition, &similar);
        match self.llm.complete(&prompt).await {
            Ok(raw) => InsightOutcome::from_reply(parse_reply(&raw), COMPARISON_PARSE_FAILED),
            Err(error) => {
                tracing::warn!(
                    event_name = "insight.comparison.failed",
                    provider = self.llm.provider(),
                    error = %error,
                    "medicine comparison failed"
                );
                InsightOutcome::failed(COMPARISON_FAILED, error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use pillsprint_core::catalog::PriceConverter;
    use pillsprint_core::domain::medicine::{MedicineRecord, MedicineRow};
    use pillsprint_db::InMemoryCatalog;

    use super::{
        similar_medicines, CompositionAnalysis, InsightOutcome, InsightService, PriceComparison,
        COMPARISON_FAILED, COMPOSITION_FAILED, COMPOSITION_PARSE_FAILED,
    };
    use crate::test_support::{FailingCatalog, FailingLlm, ScriptedLlm};

    fn rows() -> Vec<MedicineRow> {
        vec![
            MedicineRow::new("m1", "Crocin Advance", "Pain Relief", Decimal::ONE),
            MedicineRow::new("m2", "Dolo 650", "Pain Relief", Decimal::ONE),
            MedicineRow::new("m3", "Cetirizine", "Allergy", Decimal::ONE),
        ]
    }

    fn service(llm: Arc<ScriptedLlm>) -> InsightService {
        InsightService::new(llm, Arc::new(InMemoryCatalog::from_rows(rows())))
    }

    #[test]
    fn similar_medicines_share_the_first_match_category() {
        let converter = PriceConverter::default();
        let catalog: Vec<MedicineRecord> =
            rows().into_iter().map(|row| converter.normalize(row)).collect();

        let names: Vec<&str> = similar_medicines("CROCIN", &catalog)
            .iter()
            .map(|record| record.name.as_str())
            .collect();
        assert_eq!(names, vec!["Crocin Advance", "Dolo 650"]);

        assert!(similar_medicines("unknown", &catalog).is_empty());
    }

    #[tokio::test]
    async fn composition_reply_is_structured() {
        let llm = Arc::new(ScriptedLlm::new(
            "```json\n{\"ingredients\": [{\"name\": \"Paracetamol\", \"purpose\": \"Analgesic\"}, \"Caffeine\"],\n\"benefits\": \"Fast relief\", \"side_effects\": [\"Nausea\"], \"warnings\": [], \"suitability\": \"Good for fever\"}\n```",
        ));

        let outcome = service(llm.clone())
            .analyze_composition("Paracetamol + Caffeine", Some("fever"))
            .await;

        let InsightOutcome::Structured { value } = outcome else {
            panic!("expected structured outcome, got {outcome:?}");
        };
        assert_eq!(value.ingredients.len(), 2);
        assert_eq!(value.ingredients[0].purpose.as_deref(), Some("Analgesic"));
        assert_eq!(value.ingredients[1].name, "Caffeine");
        assert_eq!(value.benefits, vec!["Fast relief".to_string()]);
        assert_eq!(value.suitability.as_deref(), Some("Good for fever"));
        assert!(llm.prompts()[0].contains("trying to treat: \"fever\""));
    }

    #[tokio::test]
    async fn composition_prose_is_unparseable_with_raw_text() {
        let llm = Arc::new(ScriptedLlm::new("Paracetamol is a pain reliever."));

        let outcome = service(llm).analyze_composition("Paracetamol", None).await;

        assert_eq!(
            outcome,
            InsightOutcome::<CompositionAnalysis>::Unparseable {
                error: COMPOSITION_PARSE_FAILED.to_string(),
                raw_response: "Paracetamol is a pain reliever.".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn composition_model_failure_is_reported() {
        let service =
            InsightService::new(Arc::new(FailingLlm), Arc::new(InMemoryCatalog::from_rows(rows())));

        let outcome = service.analyze_composition("Paracetamol", None).await;

        assert!(matches!(
            outcome,
            InsightOutcome::Failed { ref error, .. } if error == COMPOSITION_FAILED
        ));
    }

    #[tokio::test]
    async fn comparison_prompt_only_lists_similar_medicines() {
        let llm = Arc::new(ScriptedLlm::new(
            r#"{"estimated_price_range": "INR 20-40", "alternatives": [{"name": "Dolo 650", "price": 30}], "generic_options": ["Paracetamol IP"], "summary": "Dolo is cheaper"}"#,
        ));

        let outcome = service(llm.clone()).compare_options("crocin", None).await;

        let InsightOutcome::Structured { value } = outcome else {
            panic!("expected structured outcome, got {outcome:?}");
        };
        assert_eq!(value.alternatives[0].price.as_deref(), Some("30"));
        assert_eq!(value.generic_options[0].name, "Paracetamol IP");
        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("Dolo 650"));
        assert!(!prompt.contains("Cetirizine"));
    }

    #[tokio::test]
    async fn comparison_catalog_failure_skips_the_model() {
        let llm = Arc::new(ScriptedLlm::new("{}"));
        let service = InsightService::new(llm.clone(), Arc::new(FailingCatalog::default()));

        let outcome: InsightOutcome<PriceComparison> =
            service.compare_options("crocin", None).await;

        assert!(matches!(
            outcome,
            InsightOutcome::Failed { ref error, .. } if error == COMPARISON_FAILED
        ));
        assert_eq!(llm.calls(), 0);
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let outcome: InsightOutcome<PriceComparison> = InsightOutcome::Unparseable {
            error: "Failed to parse medicine comparison".to_string(),
            raw_response: "nope".to_string(),
        };

        let json = serde_json::to_value(&outcome).expect("serialize");

        assert_eq!(json["kind"], "unparseable");
        assert_eq!(json["raw_response"], "nope");
    }
}
