use rust_decimal::Decimal;

use crate::domain::medicine::{MedicineId, MedicineRecord, MedicineRow, DEFAULT_EXPIRY_MONTHS};

pub const DEFAULT_PRICE_MULTIPLIER: i64 = 83;
pub const DEFAULT_DISPLAY_CURRENCY: &str = "INR";

/// Converts stored base-unit prices into the display currency and turns raw
/// store rows into [`MedicineRecord`]s. This is the only place the multiplier
/// is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceConverter {
    multiplier: Decimal,
    currency: String,
}

impl Default for PriceConverter {
    fn default() -> Self {
        Self::new(Decimal::from(DEFAULT_PRICE_MULTIPLIER), DEFAULT_DISPLAY_CURRENCY)
    }
}

impl PriceConverter {
    pub fn new(multiplier: Decimal, currency: impl Into<String>) -> Self {
        Self { multiplier, currency: currency.into() }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn multiplier(&self) -> Decimal {
        self.multiplier
    }

    /// Monotonic non-decreasing in `base`; negatives clamp to zero.
    pub fn to_display(&self, base: Decimal) -> Decimal {
        if base.is_sign_negative() {
            return Decimal::ZERO;
        }
        base.checked_mul(self.multiplier).unwrap_or(Decimal::MAX)
    }

    pub fn format(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp(2);
        match self.currency.as_str() {
            "INR" => format!("₹{rounded}"),
            "USD" => format!("${rounded}"),
            "EUR" => format!("€{rounded}"),
            "GBP" => format!("£{rounded}"),
            other => format!("{other} {rounded}"),
        }
    }

    pub fn normalize(&self, row: MedicineRow) -> MedicineRecord {
        MedicineRecord {
            id: MedicineId(row.id),
            name: row.name,
            description: row.description.unwrap_or_default(),
            category: row.category.unwrap_or_else(|| "Uncategorized".to_string()),
            manufacturer: row.manufacturer,
            dosage_form: row.dosage_form,
            strength: row.strength,
            package_size: row.package_size,
            image_url: row.image_url,
            price: self.to_display(row.base_price),
            stock: clamp_count(row.stock, 0),
            emergency: row.emergency.unwrap_or(false),
            requires_prescription: row.requires_prescription.unwrap_or(false),
            composition: row.composition.unwrap_or_default(),
            alternatives: row.alternatives.unwrap_or_default(),
            side_effects: row.side_effects.unwrap_or_default(),
            warnings: row.warnings.unwrap_or_default(),
            usage_instructions: row.usage_instructions,
            storage_instructions: row.storage_instructions,
            expiry_months: clamp_count(row.expiry_months, DEFAULT_EXPIRY_MONTHS),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn clamp_count(value: Option<i64>, default: u32) -> u32 {
    match value {
        None => default,
        Some(value) => u32::try_from(value.max(0)).unwrap_or(u32::MAX),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::PriceConverter;
    use crate::domain::medicine::MedicineRow;

    #[test]
    fn equal_base_prices_normalize_equally() {
        let converter = PriceConverter::default();
        let left = converter.to_display(Decimal::new(499, 2));
        let right = converter.to_display(Decimal::new(4990, 3));

        assert_eq!(left, right);
        assert_eq!(left, Decimal::new(41417, 2));
    }

    #[test]
    fn conversion_preserves_price_order() {
        let converter = PriceConverter::default();
        let mut raw = vec![
            Decimal::new(1250, 2),
            Decimal::new(99, 2),
            Decimal::new(1249, 2),
            Decimal::new(500, 2),
            Decimal::ZERO,
        ];
        let mut converted: Vec<_> = raw.iter().map(|price| converter.to_display(*price)).collect();

        raw.sort();
        converted.sort();

        let expected: Vec<_> = raw.iter().map(|price| converter.to_display(*price)).collect();
        assert_eq!(converted, expected);
    }

    #[test]
    fn negative_prices_clamp_to_zero() {
        let converter = PriceConverter::default();
        assert_eq!(converter.to_display(Decimal::new(-5, 0)), Decimal::ZERO);
    }

    #[test]
    fn nullable_fields_get_defaults() {
        let converter = PriceConverter::new(Decimal::ONE, "USD");
        let record = converter.normalize(MedicineRow {
            id: "m1".to_string(),
            name: "Oral Rehydration Salts".to_string(),
            base_price: Decimal::new(150, 2),
            stock: Some(-3),
            ..MedicineRow::default()
        });

        assert_eq!(record.stock, 0);
        assert!(!record.emergency);
        assert!(!record.requires_prescription);
        assert!(record.composition.is_empty());
        assert!(record.warnings.is_empty());
        assert_eq!(record.expiry_months, 24);
        assert_eq!(record.category, "Uncategorized");
        assert_eq!(record.price, Decimal::new(150, 2));
    }

    #[test]
    fn format_uses_currency_symbol() {
        let converter = PriceConverter::default();
        assert_eq!(converter.format(Decimal::new(41417, 2)), "₹414.17");
        assert_eq!(PriceConverter::new(Decimal::ONE, "CHF").format(Decimal::TEN), "CHF 10");
    }
}
