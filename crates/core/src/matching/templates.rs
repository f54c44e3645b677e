//! Fixed explanatory text for keyword-matched recommendations

use crate::domain::medicine::MedicineRecord;

pub const DEFAULT_USAGE: &str = "Follow package directions or consult healthcare provider";
pub const DEFAULT_PRECAUTIONS: &str = "Consult healthcare provider before use";

/// (symptom keyword, category, reason template). `{name}` is replaced with the
/// medicine name.
const REASON_OVERRIDES: &[(&str, &str, &str)] = &[
    ("headache", "Pain Relief", "{name} is effective for headache relief and pain management"),
    ("fever", "Pain Relief", "{name} helps reduce fever and associated discomfort"),
    ("cough", "Cough & Cold", "{name} provides relief from cough and throat irritation"),
    ("allergy", "Allergy", "{name} helps control allergic reactions and symptoms"),
    ("stomach", "Digestive", "{name} helps with digestive issues and stomach discomfort"),
];

/// `lowered_symptoms` must already be lower-cased.
pub fn reason_for(lowered_symptoms: &str, record: &MedicineRecord) -> String {
    let specific = REASON_OVERRIDES.iter().find(|(keyword, category, _)| {
        lowered_symptoms.contains(keyword) && record.category == *category
    });
    if let Some((_, _, template)) = specific {
        return template.replace("{name}", &record.name);
    }
    if record.emergency {
        return format!(
            "{} is an emergency medication suitable for urgent situations",
            record.name
        );
    }
    format!("{} from our {} category may help with your symptoms", record.name, record.category)
}

pub fn how_it_helps(record: &MedicineRecord) -> String {
    if !record.description.trim().is_empty() {
        return record.description.clone();
    }
    category_benefit(&record.category).to_string()
}

pub fn category_benefit(category: &str) -> &'static str {
    match category {
        "Pain Relief" => "Reduces pain and inflammation, providing relief from discomfort",
        "Cough & Cold" => "Soothes throat irritation and helps suppress cough",
        "Allergy" => "Blocks histamine reactions that cause allergy symptoms",
        "Digestive" => "Helps restore normal digestive function and reduces stomach discomfort",
        "Emergency" => "Provides rapid relief in emergency situations",
        "Vitamins" => "Supports overall health and immune system function",
        _ => "Provides therapeutic benefit for your condition",
    }
}

pub fn usage_for(record: &MedicineRecord) -> String {
    record
        .usage_instructions
        .as_deref()
        .filter(|usage| !usage.trim().is_empty())
        .unwrap_or(DEFAULT_USAGE)
        .to_string()
}

pub fn precautions_for(record: &MedicineRecord) -> String {
    if record.warnings.is_empty() {
        return DEFAULT_PRECAUTIONS.to_string();
    }
    record.warnings.join(", ")
}

pub fn fallback_analysis(symptoms: &str) -> String {
    format!(
        "Based on your symptoms: \"{}\", here are some medicine options from our store.",
        symptoms.trim()
    )
}
