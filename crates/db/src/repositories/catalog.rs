use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Row, Sqlite};

use pillsprint_core::catalog::{
    is_blank_query, CatalogAccessor, CatalogFilter, PriceConverter, DEFAULT_SEARCH_LIMIT,
};
use pillsprint_core::domain::medicine::{MedicineId, MedicineRecord, MedicineRow};
use pillsprint_core::errors::CatalogError;

use super::RepositoryError;
use crate::DbPool;

const MEDICINE_COLUMNS: &str = "id, name, description, category, manufacturer, dosage_form,
    strength, package_size, image_url, base_price, stock, emergency, requires_prescription,
    composition, alternatives, side_effects, warnings, usage_instructions,
    storage_instructions, expiry_months, created_at, updated_at";

pub struct SqlCatalogRepository {
    pool: DbPool,
    converter: PriceConverter,
    search_limit: usize,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, converter: PriceConverter::default(), search_limit: DEFAULT_SEARCH_LIMIT }
    }

    pub fn with_converter(mut self, converter: PriceConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_search_limit(mut self, search_limit: usize) -> Self {
        self.search_limit = search_limit.max(1);
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Insert or replace a row by id. Used by seeding and operator tooling; the
    /// recommendation path never writes.
    pub async fn upsert(&self, row: &MedicineRow) -> Result<(), RepositoryError> {
        upsert_row(&self.pool, row).await
    }

    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM medicine").fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn fetch_rows(
        &self,
        filters: &CatalogFilter,
    ) -> Result<Vec<MedicineRecord>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {MEDICINE_COLUMNS} FROM medicine WHERE 1 = 1"));

        for (field, value) in filters.supported() {
            if field.is_flag() {
                match value.as_flag() {
                    Some(flag) => {
                        query.push(format!(" AND COALESCE({}, 0) = ", field.column()));
                        query.push_bind(flag);
                    }
                    None => {
                        query.push(" AND 0");
                    }
                }
            } else {
                query.push(format!(" AND {} = ", field.column()));
                query.push_bind(value.as_text());
            }
        }
        query.push(" ORDER BY name");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row_to_medicine(row).map(|raw| self.converter.normalize(raw)))
            .collect()
    }

    async fn search_rows(&self, needle: &str) -> Result<Vec<MedicineRecord>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(needle));
        let rows = sqlx::query(&format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicine
             WHERE name LIKE ?1 ESCAPE '\\'
                OR description LIKE ?1 ESCAPE '\\'
                OR manufacturer LIKE ?1 ESCAPE '\\'
                OR category LIKE ?1 ESCAPE '\\'
                OR dosage_form LIKE ?1 ESCAPE '\\'
             ORDER BY name
             LIMIT ?2"
        ))
        .bind(&pattern)
        .bind(self.search_limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row_to_medicine(row).map(|raw| self.converter.normalize(raw)))
            .collect()
    }
}

#[async_trait]
impl CatalogAccessor for SqlCatalogRepository {
    async fn list_all(&self, filters: &CatalogFilter) -> Result<Vec<MedicineRecord>, CatalogError> {
        let ignored = filters.ignored_keys();
        if !ignored.is_empty() {
            tracing::debug!(
                event_name = "catalog.filter.ignored",
                keys = ?ignored,
                "ignoring unsupported catalog filter keys"
            );
        }

        match self.fetch_rows(filters).await {
            Ok(records) => {
                tracing::debug!(
                    event_name = "catalog.list",
                    count = records.len(),
                    "listed medicines"
                );
                Ok(records)
            }
            Err(error) => {
                tracing::error!(
                    event_name = "catalog.list.failed",
                    error = %error,
                    "catalog listing failed"
                );
                Err(error.into())
            }
        }
    }

    async fn get_by_id(&self, id: &MedicineId) -> Result<MedicineRecord, CatalogError> {
        let row = sqlx::query(&format!("SELECT {MEDICINE_COLUMNS} FROM medicine WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                tracing::error!(
                    event_name = "catalog.get.failed",
                    id = %id,
                    error = %error,
                    "catalog lookup failed"
                );
                CatalogError::from(RepositoryError::from(error))
            })?;

        match row {
            Some(ref row) => Ok(self.converter.normalize(row_to_medicine(row)?)),
            None => Err(CatalogError::NotFound { id: id.clone() }),
        }
    }

    async fn search(&self, text: &str) -> Result<Vec<MedicineRecord>, CatalogError> {
        if is_blank_query(text) {
            return Ok(Vec::new());
        }

        match self.search_rows(text.trim()).await {
            Ok(records) => {
                tracing::debug!(
                    event_name = "catalog.search",
                    count = records.len(),
                    "searched medicines"
                );
                Ok(records)
            }
            Err(error) => {
                tracing::error!(
                    event_name = "catalog.search.failed",
                    error = %error,
                    "catalog search failed"
                );
                Err(error.into())
            }
        }
    }
}

pub(crate) async fn upsert_row<'e, E>(executor: E, row: &MedicineRow) -> Result<(), RepositoryError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO medicine (id, name, description, category, manufacturer, dosage_form,
                               strength, package_size, image_url, base_price, stock, emergency,
                               requires_prescription, composition, alternatives, side_effects,
                               warnings, usage_instructions, storage_instructions, expiry_months,
                               created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             description = excluded.description,
             category = excluded.category,
             manufacturer = excluded.manufacturer,
             dosage_form = excluded.dosage_form,
             strength = excluded.strength,
             package_size = excluded.package_size,
             image_url = excluded.image_url,
             base_price = excluded.base_price,
             stock = excluded.stock,
             emergency = excluded.emergency,
             requires_prescription = excluded.requires_prescription,
             composition = excluded.composition,
             alternatives = excluded.alternatives,
             side_effects = excluded.side_effects,
             warnings = excluded.warnings,
             usage_instructions = excluded.usage_instructions,
             storage_instructions = excluded.storage_instructions,
             expiry_months = excluded.expiry_months,
             updated_at = excluded.updated_at",
    )
    .bind(&row.id)
    .bind(&row.name)
    .bind(&row.description)
    .bind(&row.category)
    .bind(&row.manufacturer)
    .bind(&row.dosage_form)
    .bind(&row.strength)
    .bind(&row.package_size)
    .bind(&row.image_url)
    .bind(row.base_price.to_string())
    .bind(row.stock)
    .bind(row.emergency)
    .bind(row.requires_prescription)
    .bind(encode_list(row.composition.as_deref())?)
    .bind(encode_list(row.alternatives.as_deref())?)
    .bind(encode_list(row.side_effects.as_deref())?)
    .bind(encode_list(row.warnings.as_deref())?)
    .bind(&row.usage_instructions)
    .bind(&row.storage_instructions)
    .bind(row.expiry_months)
    .bind(row.created_at.map(|at| at.to_rfc3339()))
    .bind(row.updated_at.map(|at| at.to_rfc3339()))
    .execute(executor)
    .await?;

    Ok(())
}

fn row_to_medicine(row: &sqlx::sqlite::SqliteRow) -> Result<MedicineRow, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let base_price_str: String =
        row.try_get("base_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let base_price = Decimal::from_str(base_price_str.trim()).map_err(|e| {
        RepositoryError::Decode(format!(
            "medicine `{id}` has invalid base_price `{base_price_str}`: {e}"
        ))
    })?;

    Ok(MedicineRow {
        description: optional_text(row, "description")?,
        category: optional_text(row, "category")?,
        manufacturer: optional_text(row, "manufacturer")?,
        dosage_form: optional_text(row, "dosage_form")?,
        strength: optional_text(row, "strength")?,
        package_size: optional_text(row, "package_size")?,
        image_url: optional_text(row, "image_url")?,
        base_price,
        stock: row.try_get("stock").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        emergency: row.try_get("emergency").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        requires_prescription: row
            .try_get("requires_prescription")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        composition: decode_list(row, "composition")?,
        alternatives: decode_list(row, "alternatives")?,
        side_effects: decode_list(row, "side_effects")?,
        warnings: decode_list(row, "warnings")?,
        usage_instructions: optional_text(row, "usage_instructions")?,
        storage_instructions: optional_text(row, "storage_instructions")?,
        expiry_months: row
            .try_get("expiry_months")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        created_at: decode_timestamp(row, "created_at")?,
        updated_at: decode_timestamp(row, "updated_at")?,
        id,
        name,
    })
}

fn optional_text(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<String>, RepositoryError> {
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn decode_list(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<Vec<String>>, RepositoryError> {
    let Some(raw) = optional_text(row, column)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Vec<String>>(&raw)
        .map(Some)
        .map_err(|e| RepositoryError::Decode(format!("{column} is not a JSON string array: {e}")))
}

fn encode_list(values: Option<&[String]>) -> Result<Option<String>, RepositoryError> {
    values
        .map(|values| {
            serde_json::to_string(values).map_err(|e| RepositoryError::Decode(e.to_string()))
        })
        .transpose()
}

fn decode_timestamp(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    Ok(optional_text(row, column)?.and_then(|raw| parse_timestamp(column, &raw)))
}

/// Unparseable timestamps are logged and dropped; they never fail the read.
fn parse_timestamp(column: &str, raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(error) => {
            tracing::warn!(
                event_name = "catalog.decode.timestamp",
                column,
                value = raw,
                error = %error,
                "ignoring malformed medicine timestamp"
            );
            None
        }
    }
}

/// Escapes `%`, `_` and the escape character itself so user text is matched literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
