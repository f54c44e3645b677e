//! Symptom pattern → category rule table

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declarative form of a rule, as written in code or in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub categories: Vec<String>,
    #[serde(default)]
    pub urgent: bool,
}

impl RuleSpec {
    pub fn new(pattern: &str, categories: &[&str]) -> Self {
        Self {
            pattern: pattern.to_string(),
            categories: categories.iter().map(|category| category.to_string()).collect(),
            urgent: false,
        }
    }

    pub fn urgent(mut self) -> Self {
        self.urgent = true;
        self
    }
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid symptom pattern `{pattern}`: {source}")]
    InvalidPattern { pattern: String, source: regex::Error },
    #[error("symptom pattern `{0}` maps to no categories")]
    NoCategories(String),
}

#[derive(Clone, Debug)]
pub struct SymptomRule {
    pattern: Regex,
    categories: Vec<String>,
    urgent: bool,
}

impl SymptomRule {
    pub fn compile(spec: &RuleSpec) -> Result<Self, RuleError> {
        if spec.categories.is_empty() {
            return Err(RuleError::NoCategories(spec.pattern.clone()));
        }
        let pattern = RegexBuilder::new(&spec.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RuleError::InvalidPattern { pattern: spec.pattern.clone(), source })?;
        Ok(Self { pattern, categories: spec.categories.clone(), urgent: spec.urgent })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn is_urgent(&self) -> bool {
        self.urgent
    }
}

/// Built-in symptom table. Order matters only for the order in which matched
/// categories are reported.
pub fn canonical_rule_specs() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new("headache|head pain|migraine", &["Pain Relief"]),
        RuleSpec::new("fever|temperature|hot", &["Pain Relief", "Pediatric"]),
        RuleSpec::new("pain|ache|hurt|sore", &["Pain Relief"]),
        RuleSpec::new("muscle pain|body ache|joint pain", &["Pain Relief"]),
        RuleSpec::new("cough|throat|cold|flu", &["Cough & Cold", "Respiratory"]),
        RuleSpec::new("asthma|breathing|wheeze", &["Respiratory", "Emergency"]),
        RuleSpec::new("congestion|blocked nose|stuffy", &["Cough & Cold"]),
        RuleSpec::new("stomach|nausea|vomit|diarrhea|constipation", &["Digestive"]),
        RuleSpec::new("heartburn|acid|indigestion", &["Digestive"]),
        RuleSpec::new("allergy|allergic|rash|itch|hives", &["Allergy", "Skin Care"]),
        RuleSpec::new("runny nose|sneezing|hay fever", &["Allergy"]),
        RuleSpec::new(
            "emergency|urgent|severe|chest pain|difficulty breathing",
            &["Emergency", "Cardiac"],
        )
        .urgent(),
        RuleSpec::new("burn|wound|cut|injury", &["First Aid", "Skin Care"]),
        RuleSpec::new("sleep|insomnia|tired|restless", &["Sleep Aid"]),
        RuleSpec::new("pregnancy|prenatal|iron deficiency", &["Women's Health"]),
        RuleSpec::new("child|baby|kid|pediatric", &["Pediatric"]),
        RuleSpec::new("vitamin|supplement|immunity|energy", &["Vitamins"]),
        RuleSpec::new("diabetes|blood sugar|glucose", &["Diabetes"]),
        RuleSpec::new("eye|vision|dry eyes", &["Eye Care"]),
        RuleSpec::new("ear|hearing|wax", &["Ear Care"]),
    ]
}

#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    rules: Vec<SymptomRule>,
}

impl RuleTable {
    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self, RuleError> {
        let rules = specs.iter().map(SymptomRule::compile).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn canonical() -> Self {
        let rules = canonical_rule_specs()
            .iter()
            .filter_map(|spec| match SymptomRule::compile(spec) {
                Ok(rule) => Some(rule),
                Err(error) => {
                    tracing::error!(
                        event_name = "matching.rule.invalid",
                        pattern = %spec.pattern,
                        error = %error,
                        "built-in symptom rule failed to compile"
                    );
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Canonical table followed by `extra`, which are evaluated after the built-ins.
    pub fn canonical_with(extra: &[RuleSpec]) -> Result<Self, RuleError> {
        let mut table = Self::canonical();
        for spec in extra {
            table.rules.push(SymptomRule::compile(spec)?);
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[SymptomRule] {
        &self.rules
    }

    /// Union of categories for every rule matching anywhere in `text`, in
    /// first-seen order.
    pub fn matching_categories(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut categories: Vec<String> = Vec::new();
        for rule in self.rules.iter().filter(|rule| rule.is_match(&lowered)) {
            for category in rule.categories() {
                if !categories.contains(category) {
                    categories.push(category.clone());
                }
            }
        }
        categories
    }

    pub fn signals_urgency(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.rules.iter().any(|rule| rule.is_urgent() && rule.is_match(&lowered))
    }
}
