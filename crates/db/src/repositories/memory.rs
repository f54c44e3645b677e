use std::collections::BTreeMap;

use tokio::sync::RwLock;

use pillsprint_core::catalog::{
    is_blank_query, matches_search, sort_by_name, CatalogAccessor, CatalogFilter, PriceConverter,
    DEFAULT_SEARCH_LIMIT,
};
use pillsprint_core::domain::medicine::{MedicineId, MedicineRecord, MedicineRow};
use pillsprint_core::errors::CatalogError;

/// Catalog held in process. Rows are stored raw and normalized on every read,
/// the same way the SQL store does it.
pub struct InMemoryCatalog {
    rows: RwLock<BTreeMap<String, MedicineRow>>,
    converter: PriceConverter,
    search_limit: usize,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new(PriceConverter::default())
    }
}

impl InMemoryCatalog {
    pub fn new(converter: PriceConverter) -> Self {
        Self { rows: RwLock::default(), converter, search_limit: DEFAULT_SEARCH_LIMIT }
    }

    pub fn from_rows(rows: impl IntoIterator<Item = MedicineRow>) -> Self {
        let rows = rows.into_iter().map(|row| (row.id.clone(), row)).collect();
        Self { rows: RwLock::new(rows), ..Self::default() }
    }

    /// Caps `search` results, matching `SqlCatalogRepository::with_search_limit`.
    pub fn with_search_limit(mut self, search_limit: usize) -> Self {
        self.search_limit = search_limit.max(1);
        self
    }

    pub async fn upsert(&self, row: MedicineRow) {
        let mut rows = self.rows.write().await;
        rows.insert(row.id.clone(), row);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    async fn snapshot(&self) -> Vec<MedicineRecord> {
        let rows = self.rows.read().await;
        let mut records: Vec<_> =
            rows.values().cloned().map(|row| self.converter.normalize(row)).collect();
        sort_by_name(&mut records);
        records
    }
}

#[async_trait::async_trait]
impl CatalogAccessor for InMemoryCatalog {
    async fn list_all(&self, filters: &CatalogFilter) -> Result<Vec<MedicineRecord>, CatalogError> {
        Ok(self.snapshot().await.into_iter().filter(|record| filters.matches(record)).collect())
    }

    async fn get_by_id(&self, id: &MedicineId) -> Result<MedicineRecord, CatalogError> {
        let rows = self.rows.read().await;
        rows.get(id.as_str())
            .cloned()
            .map(|row| self.converter.normalize(row))
            .ok_or_else(|| CatalogError::NotFound { id: id.clone() })
    }

    async fn search(&self, text: &str) -> Result<Vec<MedicineRecord>, CatalogError> {
        if is_blank_query(text) {
            return Ok(Vec::new());
        }
        let needle = text.trim().to_lowercase();
        Ok(self
            .snapshot()
            .await
            .into_iter()
            .filter(|record| matches_search(record, &needle))
            .take(self.search_limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use pillsprint_core::catalog::{CatalogAccessor, CatalogFilter};
    use pillsprint_core::domain::medicine::{MedicineId, MedicineRow};

    use super::InMemoryCatalog;

    fn row(id: &str, name: &str, category: &str, emergency: bool) -> MedicineRow {
        let mut row = MedicineRow::new(id, name, category, Decimal::ONE);
        row.emergency = Some(emergency);
        row.stock = Some(5);
        row
    }

    #[tokio::test]
    async fn listing_is_name_ordered_and_filterable() {
        let catalog = InMemoryCatalog::from_rows([
            row("b", "Salbutamol Inhaler", "Respiratory", true),
            row("a", "Cetirizine", "Allergy", false),
        ]);

        let all = catalog.list_all(&CatalogFilter::new()).await.expect("list");
        assert_eq!(all[0].name, "Cetirizine");
        assert_eq!(all[0].price, Decimal::from(83));

        let emergency = catalog.list_emergency().await.expect("emergency");
        assert_eq!(emergency.len(), 1);
        assert_eq!(emergency[0].id.as_str(), "b");
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let catalog = InMemoryCatalog::default();
        catalog.upsert(row("a", "Old Name", "Allergy", false)).await;
        catalog.upsert(row("a", "New Name", "Allergy", false)).await;

        assert_eq!(catalog.len().await, 1);
        let record = catalog.get_by_id(&MedicineId::new("a")).await.expect("get");
        assert_eq!(record.name, "New Name");
    }

    #[tokio::test]
    async fn search_and_not_found() {
        let catalog = InMemoryCatalog::from_rows([row("a", "Cetirizine", "Allergy", false)]);

        assert_eq!(catalog.search("ALLERGY").await.expect("search").len(), 1);
        assert!(catalog.search("").await.expect("search").is_empty());
        assert!(catalog.get_by_id(&MedicineId::new("zz")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn search_respects_configured_limit() {
        let rows = (0..4)
            .map(|n| row(&format!("t{n}"), &format!("Tablet {n}"), "Pain Relief", false));
        let catalog = InMemoryCatalog::from_rows(rows).with_search_limit(2);

        let hits = catalog.search("tablet").await.expect("search");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "Tablet 0");
        assert_eq!(InMemoryCatalog::default().with_search_limit(0).search_limit, 1);
    }
}
