use pillsprint_core::domain::recommendation::{
    Recommendation, DEFAULT_DISCLAIMER, DEFAULT_EMERGENCY_NOTE, MAX_RECOMMENDATION_ITEMS,
};
use pillsprint_core::matching::templates::fallback_analysis;

/// Last step before a recommendation leaves the crate, whichever path built it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponsePolicy {
    max_items: usize,
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self { max_items: MAX_RECOMMENDATION_ITEMS }
    }
}

impl ResponsePolicy {
    /// `max_items` is clamped to `1..=MAX_RECOMMENDATION_ITEMS`.
    pub fn new(max_items: usize) -> Self {
        Self { max_items: max_items.clamp(1, MAX_RECOMMENDATION_ITEMS) }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Caps items and fills blank analysis and disclaimer. An emergency note is
    /// kept only when an emergency item is present or `urgent` is set; a
    /// missing one is then replaced by the default note.
    pub fn normalize(
        &self,
        mut recommendation: Recommendation,
        symptoms: &str,
        urgent: bool,
    ) -> Recommendation {
        recommendation.items.truncate(self.max_items);

        if recommendation.analysis.trim().is_empty() {
            recommendation.analysis = fallback_analysis(symptoms);
        }
        if recommendation.disclaimer.trim().is_empty() {
            recommendation.disclaimer = DEFAULT_DISCLAIMER.to_string();
        }

        let needs_note = urgent || recommendation.has_emergency_items();
        recommendation.emergency_note = if needs_note {
            let note = recommendation.emergency_note.take().filter(|note| !note.trim().is_empty());
            Some(note.unwrap_or_else(|| DEFAULT_EMERGENCY_NOTE.to_string()))
        } else {
            None
        };

        recommendation.general_advice =
            recommendation.general_advice.take().filter(|advice| !advice.trim().is_empty());

        recommendation
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use pillsprint_core::domain::medicine::MedicineId;
    use pillsprint_core::domain::recommendation::{
        Recommendation, RecommendationItem, DEFAULT_DISCLAIMER, DEFAULT_EMERGENCY_NOTE,
    };

    use super::ResponsePolicy;

    fn item(id: &str, emergency: bool) -> RecommendationItem {
        RecommendationItem {
            medicine_id: MedicineId::new(id),
            name: id.to_uppercase(),
            category: "Pain Relief".to_string(),
            dosage_form: "Tablet".to_string(),
            price: Decimal::ONE,
            emergency,
            reason: String::new(),
            how_it_helps: String::new(),
            usage: String::new(),
            precautions: String::new(),
        }
    }

    fn model_output(items: Vec<RecommendationItem>) -> Recommendation {
        Recommendation {
            analysis: "  ".to_string(),
            items,
            emergency_note: Some("Seek help".to_string()),
            general_advice: Some(String::new()),
            disclaimer: String::new(),
            is_fallback: false,
        }
    }

    #[test]
    fn caps_items_and_fills_blank_text() {
        let items = (0..8).map(|index| item(&format!("m{index}"), false)).collect();

        let normalized = ResponsePolicy::default().normalize(model_output(items), "fever", false);

        assert_eq!(normalized.items.len(), 5);
        assert_eq!(normalized.items[0].medicine_id.as_str(), "m0");
        assert!(normalized.analysis.contains("\"fever\""));
        assert_eq!(normalized.disclaimer, DEFAULT_DISCLAIMER);
        assert_eq!(normalized.general_advice, None);
        assert!(!normalized.is_fallback);
    }

    #[test]
    fn configured_cap_never_exceeds_hard_limit() {
        assert_eq!(ResponsePolicy::new(50).max_items(), 5);
        assert_eq!(ResponsePolicy::new(0).max_items(), 1);
        assert_eq!(ResponsePolicy::new(3).max_items(), 3);
    }

    #[test]
    fn emergency_note_follows_items_and_urgency() {
        let policy = ResponsePolicy::default();

        let calm = policy.normalize(model_output(vec![item("m1", false)]), "mild cough", false);
        assert_eq!(calm.emergency_note, None);

        let urgent = policy.normalize(model_output(vec![item("m1", false)]), "chest pain", true);
        assert_eq!(urgent.emergency_note.as_deref(), Some("Seek help"));

        let mut silent = model_output(vec![item("m2", true)]);
        silent.emergency_note = None;
        let silent = policy.normalize(silent, "wheeze", false);
        assert_eq!(silent.emergency_note.as_deref(), Some(DEFAULT_EMERGENCY_NOTE));
    }
}
