//! Keyword matching engine implementation

use crate::catalog::CatalogAccessor;
use crate::domain::medicine::MedicineRecord;
use crate::domain::recommendation::{
    Recommendation, RecommendationItem, DEFAULT_DISCLAIMER, DEFAULT_EMERGENCY_NOTE,
    DEFAULT_GENERAL_ADVICE,
};

use super::rules::RuleTable;
use super::templates;
use super::{DEFAULT_FALLBACK_ITEMS, DEFAULT_SAFE_CATEGORIES};

/// Deterministic symptom → medicine matcher used when the model path is unusable.
#[derive(Clone, Debug)]
pub struct KeywordMatcher {
    rules: RuleTable,
    default_categories: Vec<String>,
    max_items: usize,
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::new(
            RuleTable::canonical(),
            DEFAULT_SAFE_CATEGORIES.iter().map(|category| category.to_string()).collect(),
        )
    }
}

impl KeywordMatcher {
    pub fn new(rules: RuleTable, default_categories: Vec<String>) -> Self {
        Self { rules, default_categories, max_items: DEFAULT_FALLBACK_ITEMS }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn candidate_categories(&self, symptoms: &str) -> Vec<String> {
        self.rules.matching_categories(symptoms)
    }

    pub fn signals_urgency(&self, symptoms: &str) -> bool {
        self.rules.signals_urgency(symptoms)
    }

    /// In-stock snapshot records whose category matched a rule, ranked.
    pub fn category_candidates(
        &self,
        symptoms: &str,
        snapshot: &[MedicineRecord],
    ) -> Vec<MedicineRecord> {
        let categories = self.candidate_categories(symptoms);
        let mut candidates: Vec<MedicineRecord> = snapshot
            .iter()
            .filter(|record| record.in_stock() && categories.contains(&record.category))
            .cloned()
            .collect();
        rank(&mut candidates);
        candidates
    }

    /// Best-effort recommendation that never fails. Text-search hits are used as
    /// returned, stock included. Catalog errors during the text-search step are
    /// logged and treated as "no hits".
    pub async fn recommend(
        &self,
        symptoms: &str,
        snapshot: &[MedicineRecord],
        catalog: &dyn CatalogAccessor,
    ) -> Recommendation {
        let mut candidates = self.category_candidates(symptoms, snapshot);

        if candidates.is_empty() {
            tracing::debug!(
                event_name = "matching.search_fallback",
                "no category matches, trying catalog text search"
            );
            candidates = match catalog.search(symptoms).await {
                Ok(hits) => hits,
                Err(error) => {
                    tracing::warn!(
                        event_name = "matching.search_failed",
                        error = %error,
                        "catalog search failed during fallback matching"
                    );
                    Vec::new()
                }
            };
            rank(&mut candidates);
        }

        if candidates.is_empty() {
            candidates = snapshot
                .iter()
                .filter(|record| {
                    record.in_stock() && self.default_categories.contains(&record.category)
                })
                .cloned()
                .collect();
            rank(&mut candidates);
        }

        candidates.truncate(self.max_items);
        self.build(symptoms, &candidates)
    }

    fn build(&self, symptoms: &str, selected: &[MedicineRecord]) -> Recommendation {
        let lowered = symptoms.to_lowercase();
        let items: Vec<RecommendationItem> = selected
            .iter()
            .map(|record| {
                RecommendationItem::from_record(
                    record,
                    templates::reason_for(&lowered, record),
                    templates::how_it_helps(record),
                    templates::usage_for(record),
                    templates::precautions_for(record),
                )
            })
            .collect();

        let urgent = items.iter().any(|item| item.emergency) || self.signals_urgency(symptoms);

        Recommendation {
            analysis: templates::fallback_analysis(symptoms),
            items,
            emergency_note: urgent.then(|| DEFAULT_EMERGENCY_NOTE.to_string()),
            general_advice: Some(DEFAULT_GENERAL_ADVICE.to_string()),
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
            is_fallback: true,
        }
    }
}

/// Emergency first, then higher stock. Stable, so ties keep catalog order.
pub fn rank(candidates: &mut [MedicineRecord]) {
    candidates.sort_by(|left, right| {
        right.emergency.cmp(&left.emergency).then_with(|| right.stock.cmp(&left.stock))
    });
}
