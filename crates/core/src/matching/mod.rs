//! Deterministic keyword matching.
//!
//! Symptom text is run through a fixed table of case-insensitive patterns,
//! each mapping to catalog categories. The resulting [`KeywordMatcher`] can
//! always produce a recommendation from a catalog snapshot, which is what makes
//! it the safety net behind the model-backed path.

pub mod engine;
pub mod rules;
pub mod templates;

pub use engine::{rank, KeywordMatcher};
pub use rules::{canonical_rule_specs, RuleError, RuleSpec, RuleTable, SymptomRule};

/// Number of items the keyword path returns.
pub const DEFAULT_FALLBACK_ITEMS: usize = 4;

/// Categories offered when neither rules nor text search found anything.
pub const DEFAULT_SAFE_CATEGORIES: &[&str] = &["Pain Relief", "Vitamins", "Digestive"];
