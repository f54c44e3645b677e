use std::collections::BTreeMap;

use crate::domain::medicine::MedicineRecord;

/// Columns that accept equality filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterField {
    Id,
    Name,
    Category,
    Manufacturer,
    DosageForm,
    Emergency,
    RequiresPrescription,
}

impl FilterField {
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "category" => Some(Self::Category),
            "manufacturer" => Some(Self::Manufacturer),
            "dosage_form" | "dosageform" => Some(Self::DosageForm),
            "emergency" => Some(Self::Emergency),
            "requires_prescription" | "requiresprescription" => Some(Self::RequiresPrescription),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Category => "category",
            Self::Manufacturer => "manufacturer",
            Self::DosageForm => "dosage_form",
            Self::Emergency => "emergency",
            Self::RequiresPrescription => "requires_prescription",
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, Self::Emergency | Self::RequiresPrescription)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Flag(bool),
}

impl FilterValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(*value),
            Self::Text(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Flag(value) => value.to_string(),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Text(value) if value.is_empty())
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Key → exact-value filter. Keys are kept verbatim so callers can report
/// which ones were ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    entries: BTreeMap<String, FilterValue>,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emergency_only() -> Self {
        Self::new().eq("emergency", true)
    }

    pub fn eq(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recognised, non-empty conditions in stable column order.
    pub fn supported(&self) -> Vec<(FilterField, &FilterValue)> {
        let mut conditions: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .filter_map(|(key, value)| FilterField::parse(key).map(|field| (field, value)))
            .collect();
        conditions.sort_by_key(|(field, _)| *field);
        conditions
    }

    pub fn ignored_keys(&self) -> Vec<&str> {
        self.entries
            .keys()
            .filter(|key| FilterField::parse(key).is_none())
            .map(String::as_str)
            .collect()
    }

    pub fn matches(&self, record: &MedicineRecord) -> bool {
        self.supported().into_iter().all(|(field, value)| field_matches(record, field, value))
    }
}

fn field_matches(record: &MedicineRecord, field: FilterField, value: &FilterValue) -> bool {
    let text = |actual: Option<&str>| actual == Some(value.as_text().as_str());
    match field {
        FilterField::Id => text(Some(record.id.as_str())),
        FilterField::Name => text(Some(&record.name)),
        FilterField::Category => text(Some(&record.category)),
        FilterField::Manufacturer => text(record.manufacturer.as_deref()),
        FilterField::DosageForm => text(record.dosage_form.as_deref()),
        FilterField::Emergency => value.as_flag() == Some(record.emergency),
        FilterField::RequiresPrescription => value.as_flag() == Some(record.requires_prescription),
    }
}
