use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::medicine::{MedicineId, MedicineRecord};

pub const DEFAULT_DISCLAIMER: &str = "This is not medical advice. Always consult with a healthcare professional before taking any medication.";

pub const DEFAULT_GENERAL_ADVICE: &str = "These are general recommendations. Please consult a healthcare professional for proper diagnosis and treatment.";

pub const DEFAULT_EMERGENCY_NOTE: &str = "Your symptoms may need urgent attention. If you have chest pain, difficulty breathing, or rapidly worsening symptoms, call emergency services or visit the nearest hospital now.";

pub const REPHRASE_ANALYSIS: &str =
    "Please describe your symptoms (for example: \"headache and mild fever since yesterday\") so we can suggest suitable medicines.";

/// Upper bound on `items` regardless of configuration.
pub const MAX_RECOMMENDATION_ITEMS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationItem {
    #[serde(rename = "id")]
    pub medicine_id: MedicineId,
    pub name: String,
    pub category: String,
    pub dosage_form: String,
    pub price: Decimal,
    pub emergency: bool,
    pub reason: String,
    pub how_it_helps: String,
    pub usage: String,
    pub precautions: String,
}

impl RecommendationItem {
    /// Builds an item whose display fields come from the catalog record, so the
    /// justification text is the only thing a producer contributes.
    pub fn from_record(
        record: &MedicineRecord,
        reason: impl Into<String>,
        how_it_helps: impl Into<String>,
        usage: impl Into<String>,
        precautions: impl Into<String>,
    ) -> Self {
        Self {
            medicine_id: record.id.clone(),
            name: record.name.clone(),
            category: record.category.clone(),
            dosage_form: record.dosage_form.clone().unwrap_or_else(|| "Tablet".to_string()),
            price: record.price,
            emergency: record.emergency,
            reason: reason.into(),
            how_it_helps: how_it_helps.into(),
            usage: usage.into(),
            precautions: precautions.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub analysis: String,
    pub items: Vec<RecommendationItem>,
    pub emergency_note: Option<String>,
    pub general_advice: Option<String>,
    pub disclaimer: String,
    pub is_fallback: bool,
}

impl Recommendation {
    pub fn empty(analysis: impl Into<String>, is_fallback: bool) -> Self {
        Self {
            analysis: analysis.into(),
            items: Vec::new(),
            emergency_note: None,
            general_advice: None,
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
            is_fallback,
        }
    }

    /// Response for a blank query: nothing was looked up, the caller is asked to rephrase.
    pub fn rephrase() -> Self {
        Self::empty(REPHRASE_ANALYSIS, true)
    }

    pub fn has_emergency_items(&self) -> bool {
        self.items.iter().any(|item| item.emergency)
    }

    pub fn medicine_ids(&self) -> Vec<&MedicineId> {
        self.items.iter().map(|item| &item.medicine_id).collect()
    }
}
