use thiserror::Error;

use crate::domain::medicine::MedicineId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog store failure: {message}")]
    Store { message: String, code: Option<String>, detail: Option<String> },
    #[error("medicine `{id}` was not found")]
    NotFound { id: MedicineId },
}

impl CatalogError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store { message: message.into(), code: None, detail: None }
    }

    pub fn with_code(self, code: impl Into<String>) -> Self {
        match self {
            Self::Store { message, detail, .. } => {
                Self::Store { message, code: Some(code.into()), detail }
            }
            other => other,
        }
    }

    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        match self {
            Self::Store { message, code, .. } => {
                Self::Store { message, code, detail: Some(detail.into()) }
            }
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Store failures can be retried by the caller; a missing id cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store { .. })
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Store { .. } => "We could not load medicines right now. Please retry shortly.",
            Self::NotFound { .. } => "That medicine is no longer available in our store.",
        }
    }
}

/// Failures on the AI recommendation path. Every variant is recoverable by the
/// keyword fallback.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecommendationError {
    #[error("catalog is empty; nothing to recommend from")]
    EmptyCatalog,
    #[error("model response could not be used: {reason}")]
    Parse { reason: String, raw: String },
    #[error("model call exceeded {after_secs}s")]
    Timeout { after_secs: u64 },
    #[error("model call failed: {0}")]
    Llm(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl RecommendationError {
    pub fn parse(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Parse { reason: reason.into(), raw: raw.into() }
    }

    /// Stable short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyCatalog => "empty_catalog",
            Self::Parse { .. } => "parse",
            Self::Timeout { .. } => "timeout",
            Self::Llm(_) => "llm",
            Self::Catalog(_) => "catalog",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::medicine::MedicineId;
    use crate::errors::{CatalogError, RecommendationError};

    #[test]
    fn store_error_keeps_code_and_detail_for_diagnostics() {
        let error = CatalogError::store("relation does not exist")
            .with_code("42P01")
            .with_detail("medicine table missing");

        assert_eq!(
            error,
            CatalogError::Store {
                message: "relation does not exist".to_owned(),
                code: Some("42P01".to_owned()),
                detail: Some("medicine table missing".to_owned()),
            }
        );
        assert!(error.is_retryable());
        assert_eq!(error.user_message(), "We could not load medicines right now. Please retry shortly.");
    }

    #[test]
    fn not_found_is_terminal() {
        let error = CatalogError::NotFound { id: MedicineId::new("m-404") };

        assert!(error.is_not_found());
        assert!(!error.is_retryable());
        assert_eq!(error.to_string(), "medicine `m-404` was not found");
        assert_eq!(error.clone().with_code("ignored"), error);
    }

    #[test]
    fn catalog_failure_converts_into_recommendation_error() {
        let error = RecommendationError::from(CatalogError::store("timeout"));

        assert_eq!(error.kind(), "catalog");
        assert_eq!(error.to_string(), "catalog store failure: timeout");
    }

    #[test]
    fn parse_error_carries_raw_text() {
        let error = RecommendationError::parse("missing recommendations", "{\"analysis\":\"x\"}");

        assert!(matches!(
            error,
            RecommendationError::Parse { ref raw, .. } if raw == "{\"analysis\":\"x\"}"
        ));
        assert_eq!(error.kind(), "parse");
    }
}
