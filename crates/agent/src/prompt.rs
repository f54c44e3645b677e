//! Prompt text sent to the generative model.

use rust_decimal::Decimal;
use serde::Serialize;

use pillsprint_core::domain::medicine::MedicineRecord;

use crate::conversation::CatalogSummary;

/// Catalog entry as the model sees it. Prices are whole display-currency units.
#[derive(Serialize)]
struct PromptMedicine<'a> {
    id: &'a str,
    name: &'a str,
    category: &'a str,
    description: &'a str,
    dosage_form: Option<&'a str>,
    manufacturer: Option<&'a str>,
    price: Decimal,
    emergency: bool,
    requires_prescription: bool,
    composition: &'a [String],
    usage_instructions: Option<&'a str>,
    side_effects: &'a [String],
    warnings: &'a [String],
    stock: u32,
}

impl<'a> From<&'a MedicineRecord> for PromptMedicine<'a> {
    fn from(record: &'a MedicineRecord) -> Self {
        Self {
            id: record.id.as_str(),
            name: &record.name,
            category: &record.category,
            description: &record.description,
            dosage_form: record.dosage_form.as_deref(),
            manufacturer: record.manufacturer.as_deref(),
            price: record.price.round(),
            emergency: record.emergency,
            requires_prescription: record.requires_prescription,
            composition: &record.composition,
            usage_instructions: record.usage_instructions.as_deref(),
            side_effects: &record.side_effects,
            warnings: &record.warnings,
            stock: record.stock,
        }
    }
}

#[derive(Serialize)]
struct ComparisonMedicine<'a> {
    name: &'a str,
    price: Decimal,
    manufacturer: Option<&'a str>,
    composition: &'a [String],
    category: &'a str,
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

pub fn recommendation_prompt(symptoms: &str, snapshot: &[MedicineRecord]) -> String {
    let catalog: Vec<PromptMedicine<'_>> = snapshot.iter().map(PromptMedicine::from).collect();
    let catalog = to_pretty_json(&catalog);
    let symptoms = symptoms.trim();

    format!(
        r#"You are the assistant for PillSprint, an emergency medicine delivery app in India.
A user is describing symptoms: "{symptoms}".

Analyze the symptoms and recommend the MOST SUITABLE medicines from our inventory.

AVAILABLE MEDICINES IN OUR STORE:
{catalog}

INSTRUCTIONS:
1. Analyze the user's symptoms carefully.
2. Match symptoms to appropriate medicine categories and compositions.
3. Select 3-5 medicines from the inventory above. Use their exact "id" values.
4. Weigh symptom relevance, category and composition, emergency status for severe symptoms, stock availability and prescription requirements.
5. Explain how each medicine helps this user's condition.
6. Include dosage and safety information.

Respond with a single JSON object in exactly this shape:
{{
  "analysis": "Brief analysis of the symptoms and what type of treatment is needed",
  "recommendations": [
    {{
      "id": "medicine id from the inventory",
      "name": "Medicine Name",
      "reason": "Why this medicine helps with the user's symptoms",
      "category": "Medicine Category",
      "dosage_form": "Form",
      "price": "Price in INR",
      "how_it_helps": "How this medicine addresses the specific symptoms",
      "usage": "How to use this medicine for the symptoms",
      "precautions": "Important precautions for this condition"
    }}
  ],
  "emergency_note": "Only if the symptoms suggest an emergency",
  "general_advice": "General advice for the patient's condition",
  "disclaimer": "Medical disclaimer"
}}

IMPORTANT:
- Only recommend medicines that exist in the inventory above.
- Explain WHY each medicine is suitable for the specific symptoms.
- Consider emergency medicines for severe symptoms.
- Always include a proper medical disclaimer."#
    )
}

pub fn composition_prompt(composition: &str, condition: Option<&str>) -> String {
    let composition = composition.trim();
    let (condition_line, suitability_line) = match condition {
        Some(condition) => (
            format!("The user is trying to treat: \"{}\"\n", condition.trim()),
            "5. How suitable this medicine is for the specified condition (\"suitability\")\n",
        ),
        None => (String::new(), ""),
    };

    format!(
        r#"Analyze this medicine composition: "{composition}"
{condition_line}
Please provide:
1. A breakdown of each active ingredient and its purpose ("ingredients": [{{"name", "purpose"}}])
2. Potential benefits of this medicine ("benefits": [text])
3. Possible side effects ("side_effects": [text])
4. Any warnings or contraindications ("warnings": [text])
{suitability_line}
Format your response as a single JSON object with these keys."#
    )
}

pub fn comparison_prompt(
    medicine_name: &str,
    composition: Option<&str>,
    similar: &[&MedicineRecord],
) -> String {
    let medicines: Vec<ComparisonMedicine<'_>> = similar
        .iter()
        .map(|record| ComparisonMedicine {
            name: &record.name,
            price: record.price.round(),
            manufacturer: record.manufacturer.as_deref(),
            composition: &record.composition,
            category: &record.category,
        })
        .collect();
    let medicines = to_pretty_json(&medicines);
    let composition_line = composition
        .map(|composition| format!("with composition: \"{}\"\n", composition.trim()))
        .unwrap_or_default();
    let medicine_name = medicine_name.trim();

    format!(
        r#"I want to compare prices and find alternatives for "{medicine_name}"
{composition_line}
Available similar medicines in our database:
{medicines}

Please provide:
1. Estimated price range for this medicine at common pharmacies in India, in INR ("estimated_price_range")
2. 3-4 alternative medicines from our available stock with similar effects ("alternatives": [{{"name", "price", "manufacturer", "note"}}])
3. Price comparison of the alternatives in INR ("summary")
4. Any cheaper generic options from our inventory ("generic_options": [{{"name", "price", "manufacturer", "note"}}])

Format your response as a single JSON object with these keys."#
    )
}

pub fn chat_prompt(message: &str, summary: &CatalogSummary) -> String {
    let message = message.trim();
    let CatalogSummary { total, emergency, pain_relief, vitamins, digestive, allergy } = *summary;

    format!(
        r#"Act as a helpful assistant for PillSprint, an emergency medicine delivery application in India.

The user says: "{message}"

AVAILABLE MEDICINES IN OUR STORE:
We have {total} medicines available including:
- Emergency medicines: {emergency}
- Pain relief medicines: {pain_relief}
- Vitamins & supplements: {vitamins}
- Digestive medicines: {digestive}
- Allergy medicines: {allergy}
- And many more categories...

INSTRUCTIONS:
1. Respond helpfully, focusing on medicines available in our store.
2. If the user asks about specific symptoms, suggest relevant medicines from our inventory.
3. Use markdown: **bold** medicine names, bullet lists, short headed sections, and tables when comparing medicines.
4. When recommending medicines, explain WHY they help with the specific condition.
5. Include prices in Indian Rupees when relevant.
6. Consider emergency medicines for urgent symptoms.

Always include a disclaimer that you are not providing medical advice and serious conditions require a doctor's consultation.
Keep the response well-structured and easy to read."#
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use pillsprint_core::catalog::PriceConverter;
    use pillsprint_core::domain::medicine::MedicineRow;

    use super::{chat_prompt, comparison_prompt, composition_prompt, recommendation_prompt};
    use crate::conversation::CatalogSummary;

    #[test]
    fn recommendation_prompt_embeds_every_catalog_id() {
        let converter = PriceConverter::default();
        let snapshot = vec![
            converter.normalize(MedicineRow::new("m1", "Paracetamol", "Pain Relief", Decimal::ONE)),
            converter.normalize(MedicineRow::new("m2", "Adrenaline", "Emergency", Decimal::TEN)),
        ];

        let prompt = recommendation_prompt("  severe headache ", &snapshot);

        assert!(prompt.contains("\"severe headache\""));
        assert!(prompt.contains("\"id\": \"m1\""));
        assert!(prompt.contains("\"id\": \"m2\""));
        assert!(prompt.contains("\"recommendations\""));
        assert!(prompt.contains("\"price\": \"830\""));
    }

    #[test]
    fn composition_prompt_mentions_condition_only_when_given() {
        let bare = composition_prompt("Paracetamol 500mg", None);
        assert!(!bare.contains("trying to treat"));
        assert!(!bare.contains("suitability"));

        let targeted = composition_prompt("Paracetamol 500mg", Some("fever"));
        assert!(targeted.contains("The user is trying to treat: \"fever\""));
        assert!(targeted.contains("\"suitability\""));
    }

    #[test]
    fn comparison_prompt_lists_similar_medicines() {
        let converter = PriceConverter::default();
        let record =
            converter.normalize(MedicineRow::new("m1", "Crocin", "Pain Relief", Decimal::ONE));

        let prompt = comparison_prompt("crocin", Some("Paracetamol"), &[&record]);

        assert!(prompt.contains("alternatives for \"crocin\""));
        assert!(prompt.contains("with composition: \"Paracetamol\""));
        assert!(prompt.contains("\"name\": \"Crocin\""));
    }

    #[test]
    fn chat_prompt_reports_catalog_counts() {
        let summary = CatalogSummary {
            total: 18,
            emergency: 3,
            pain_relief: 2,
            vitamins: 1,
            digestive: 2,
            allergy: 1,
        };

        let prompt = chat_prompt("what helps a cold?", &summary);

        assert!(prompt.contains("We have 18 medicines"));
        assert!(prompt.contains("Emergency medicines: 3"));
        assert!(prompt.contains("The user says: \"what helps a cold?\""));
    }
}
