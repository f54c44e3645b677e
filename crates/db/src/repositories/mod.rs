use thiserror::Error;

use pillsprint_core::errors::CatalogError;

pub mod catalog;
pub mod memory;

pub use catalog::SqlCatalogRepository;
pub use memory::InMemoryCatalog;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for CatalogError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => {
                let code = source
                    .as_database_error()
                    .and_then(|database| database.code())
                    .map(|code| code.into_owned());
                let converted = CatalogError::store(source.to_string());
                match code {
                    Some(code) => converted.with_code(code),
                    None => converted,
                }
            }
            RepositoryError::Decode(detail) => {
                CatalogError::store("stored medicine row could not be decoded").with_detail(detail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pillsprint_core::errors::CatalogError;

    use super::RepositoryError;

    #[test]
    fn decode_failures_keep_detail() {
        let error = CatalogError::from(RepositoryError::Decode("bad price `abc`".to_string()));

        assert_eq!(
            error,
            CatalogError::Store {
                message: "stored medicine row could not be decoded".to_string(),
                code: None,
                detail: Some("bad price `abc`".to_string()),
            }
        );
    }

    #[test]
    fn database_failures_are_store_errors() {
        let error = CatalogError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        assert!(error.is_retryable());
    }
}
