use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shelf life assumed when the store leaves `expiry_months` empty.
pub const DEFAULT_EXPIRY_MONTHS: u32 = 24;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MedicineId(pub String);

impl MedicineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MedicineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One purchasable item, as seen by everything downstream of the catalog boundary.
///
/// `price` is always expressed in the display currency; the conversion from the
/// stored base unit happens exactly once, in [`crate::catalog::PriceConverter`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineRecord {
    pub id: MedicineId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub manufacturer: Option<String>,
    pub dosage_form: Option<String>,
    pub strength: Option<String>,
    pub package_size: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub stock: u32,
    pub emergency: bool,
    pub requires_prescription: bool,
    pub composition: Vec<String>,
    pub alternatives: Vec<String>,
    pub side_effects: Vec<String>,
    pub warnings: Vec<String>,
    pub usage_instructions: Option<String>,
    pub storage_instructions: Option<String>,
    pub expiry_months: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MedicineRecord {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A catalog row exactly as the store hands it over: nullable everywhere and
/// priced in the base unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub dosage_form: Option<String>,
    pub strength: Option<String>,
    pub package_size: Option<String>,
    pub image_url: Option<String>,
    pub base_price: Decimal,
    pub stock: Option<i64>,
    pub emergency: Option<bool>,
    pub requires_prescription: Option<bool>,
    pub composition: Option<Vec<String>>,
    pub alternatives: Option<Vec<String>>,
    pub side_effects: Option<Vec<String>>,
    pub warnings: Option<Vec<String>>,
    pub usage_instructions: Option<String>,
    pub storage_instructions: Option<String>,
    pub expiry_months: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MedicineRow {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        base_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: Some(category.into()),
            base_price,
            ..Self::default()
        }
    }
}
