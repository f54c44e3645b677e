//! Read-only access to the medicine catalog.
//!
//! Stores implement [`CatalogAccessor`]; every record they return has already
//! been normalized by [`PriceConverter::normalize`], so downstream code never
//! sees base-unit prices or nullable flags.

pub mod filter;
pub mod pricing;

use async_trait::async_trait;

use crate::domain::medicine::{MedicineId, MedicineRecord};
use crate::errors::CatalogError;

pub use filter::{CatalogFilter, FilterField, FilterValue};
pub use pricing::PriceConverter;

/// Row cap applied to free-text search.
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

#[async_trait]
pub trait CatalogAccessor: Send + Sync {
    /// Equality-filtered listing ordered by name. Unsupported filter keys are ignored.
    async fn list_all(&self, filters: &CatalogFilter) -> Result<Vec<MedicineRecord>, CatalogError>;

    async fn get_by_id(&self, id: &MedicineId) -> Result<MedicineRecord, CatalogError>;

    async fn list_emergency(&self) -> Result<Vec<MedicineRecord>, CatalogError> {
        let mut records = self.list_all(&CatalogFilter::emergency_only()).await?;
        sort_by_name(&mut records);
        Ok(records)
    }

    /// Case-insensitive substring match over name, description, manufacturer,
    /// category and dosage form. Blank input returns nothing without touching the store.
    async fn search(&self, text: &str) -> Result<Vec<MedicineRecord>, CatalogError>;
}

pub fn is_blank_query(text: &str) -> bool {
    text.trim().is_empty()
}

pub fn sort_by_name(records: &mut [MedicineRecord]) {
    records.sort_by(|left, right| left.name.cmp(&right.name));
}

/// In-process equivalent of the store's OR-across-fields search predicate.
/// `needle` must already be lower-cased and trimmed.
pub fn matches_search(record: &MedicineRecord, needle: &str) -> bool {
    let optional = [record.manufacturer.as_deref(), record.dosage_form.as_deref()];
    [record.name.as_str(), record.description.as_str(), record.category.as_str()]
        .into_iter()
        .chain(optional.into_iter().flatten())
        .any(|field| field.to_lowercase().contains(needle))
}
