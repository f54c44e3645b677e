pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod matching;

pub use catalog::{CatalogAccessor, CatalogFilter, FilterField, FilterValue, PriceConverter};
pub use config::{AppConfig, ConfigError, LlmProvider, LoadOptions, LogFormat};
pub use domain::medicine::{MedicineId, MedicineRecord, MedicineRow};
pub use domain::recommendation::{Recommendation, RecommendationItem};
pub use errors::{CatalogError, RecommendationError};
pub use matching::{KeywordMatcher, RuleSpec, RuleTable};
