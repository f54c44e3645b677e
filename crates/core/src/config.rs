use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::pricing::{DEFAULT_DISPLAY_CURRENCY, DEFAULT_PRICE_MULTIPLIER};
use crate::catalog::DEFAULT_SEARCH_LIMIT;
use crate::domain::recommendation::MAX_RECOMMENDATION_ITEMS;
use crate::matching::{RuleSpec, RuleTable, DEFAULT_FALLBACK_ITEMS, DEFAULT_SAFE_CATEGORIES};

pub const DEFAULT_CONFIG_FILE: &str = "pillsprint.toml";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub catalog: CatalogConfig,
    pub recommendation: RecommendationConfig,
    pub matching: MatchingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub max_output_tokens: u32,
}

impl LlmConfig {
    pub fn resolved_model(&self) -> String {
        if let Some(model) = self.model.as_deref().filter(|model| !model.trim().is_empty()) {
            return model.to_string();
        }
        match self.provider {
            LlmProvider::Gemini => DEFAULT_GEMINI_MODEL.to_string(),
            LlmProvider::Ollama => DEFAULT_OLLAMA_MODEL.to_string(),
            LlmProvider::Disabled => String::new(),
        }
    }

    pub fn resolved_base_url(&self) -> String {
        if let Some(base_url) = self.base_url.as_deref().filter(|url| !url.trim().is_empty()) {
            return base_url.trim_end_matches('/').to_string();
        }
        match self.provider {
            LlmProvider::Gemini => DEFAULT_GEMINI_BASE_URL.to_string(),
            LlmProvider::Ollama => DEFAULT_OLLAMA_BASE_URL.to_string(),
            LlmProvider::Disabled => String::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub display_currency: String,
    pub price_multiplier: Decimal,
    pub search_limit: u32,
}

#[derive(Clone, Debug)]
pub struct RecommendationConfig {
    pub ai_timeout_secs: u64,
    pub max_items: usize,
    pub fallback_items: usize,
}

#[derive(Clone, Debug)]
pub struct MatchingConfig {
    pub default_categories: Vec<String>,
    pub rules: Vec<RuleSpec>,
}

impl MatchingConfig {
    /// Canonical rules followed by the configured extras. Validation has
    /// already compiled these, so this only fails on a config built by hand.
    pub fn rule_table(&self) -> Result<RuleTable, ConfigError> {
        RuleTable::canonical_with(&self.rules)
            .map_err(|error| ConfigError::Validation(format!("matching.rules: {error}")))
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Gemini,
    Ollama,
    Disabled,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::Disabled => "disabled",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub ai_timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://pillsprint.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                provider: LlmProvider::Disabled,
                api_key: None,
                base_url: None,
                model: None,
                timeout_secs: 30,
                max_output_tokens: 2048,
            },
            catalog: CatalogConfig {
                display_currency: DEFAULT_DISPLAY_CURRENCY.to_string(),
                price_multiplier: Decimal::from(DEFAULT_PRICE_MULTIPLIER),
                search_limit: DEFAULT_SEARCH_LIMIT as u32,
            },
            recommendation: RecommendationConfig {
                ai_timeout_secs: 12,
                max_items: MAX_RECOMMENDATION_ITEMS,
                fallback_items: DEFAULT_FALLBACK_ITEMS,
            },
            matching: MatchingConfig {
                default_categories: DEFAULT_SAFE_CATEGORIES
                    .iter()
                    .map(|category| category.to_string())
                    .collect(),
                rules: Vec::new(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            "disabled" | "none" | "offline" => Ok(Self::Disabled),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected gemini|ollama|disabled)"
            ))),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = Some(model);
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_output_tokens) = llm.max_output_tokens {
                self.llm.max_output_tokens = max_output_tokens;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(display_currency) = catalog.display_currency {
                self.catalog.display_currency = display_currency;
            }
            if let Some(price_multiplier) = catalog.price_multiplier {
                self.catalog.price_multiplier = price_multiplier;
            }
            if let Some(search_limit) = catalog.search_limit {
                self.catalog.search_limit = search_limit;
            }
        }

        if let Some(recommendation) = patch.recommendation {
            if let Some(ai_timeout_secs) = recommendation.ai_timeout_secs {
                self.recommendation.ai_timeout_secs = ai_timeout_secs;
            }
            if let Some(max_items) = recommendation.max_items {
                self.recommendation.max_items = max_items;
            }
            if let Some(fallback_items) = recommendation.fallback_items {
                self.recommendation.fallback_items = fallback_items;
            }
        }

        if let Some(matching) = patch.matching {
            if let Some(default_categories) = matching.default_categories {
                self.matching.default_categories = default_categories;
            }
            if let Some(rules) = matching.rules {
                self.matching.rules = rules;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PILLSPRINT_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("PILLSPRINT_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("PILLSPRINT_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("PILLSPRINT_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("PILLSPRINT_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PILLSPRINT_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("PILLSPRINT_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PILLSPRINT_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("PILLSPRINT_LLM_MODEL") {
            self.llm.model = Some(value);
        }
        if let Some(value) = read_env("PILLSPRINT_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_env("PILLSPRINT_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PILLSPRINT_CATALOG_PRICE_MULTIPLIER") {
            self.catalog.price_multiplier =
                parse_env("PILLSPRINT_CATALOG_PRICE_MULTIPLIER", &value)?;
        }
        if let Some(value) = read_env("PILLSPRINT_CATALOG_DISPLAY_CURRENCY") {
            self.catalog.display_currency = value;
        }

        if let Some(value) = read_env("PILLSPRINT_RECOMMENDATION_AI_TIMEOUT_SECS") {
            self.recommendation.ai_timeout_secs =
                parse_env("PILLSPRINT_RECOMMENDATION_AI_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PILLSPRINT_RECOMMENDATION_MAX_ITEMS") {
            self.recommendation.max_items =
                parse_env("PILLSPRINT_RECOMMENDATION_MAX_ITEMS", &value)?;
        }

        let log_level =
            read_env("PILLSPRINT_LOGGING_LEVEL").or_else(|| read_env("PILLSPRINT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PILLSPRINT_LOGGING_FORMAT").or_else(|| read_env("PILLSPRINT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = Some(llm_model);
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(ai_timeout_secs) = overrides.ai_timeout_secs {
            self.recommendation.ai_timeout_secs = ai_timeout_secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_catalog(&self.catalog)?;
        validate_recommendation(&self.recommendation)?;
        validate_matching(&self.matching)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.max_output_tokens == 0 {
        return Err(ConfigError::Validation(
            "llm.max_output_tokens must be greater than zero".to_string(),
        ));
    }

    if let Some(base_url) = llm.base_url.as_deref() {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if llm.provider == LlmProvider::Gemini {
        let missing = llm
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "llm.api_key is required for the gemini provider. Set PILLSPRINT_LLM_API_KEY or use provider `disabled` for keyword-only mode".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.price_multiplier <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "catalog.price_multiplier must be greater than zero".to_string(),
        ));
    }

    if catalog.display_currency.trim().is_empty() {
        return Err(ConfigError::Validation(
            "catalog.display_currency must not be empty".to_string(),
        ));
    }

    if catalog.search_limit == 0 || catalog.search_limit > 500 {
        return Err(ConfigError::Validation(
            "catalog.search_limit must be in range 1..=500".to_string(),
        ));
    }

    Ok(())
}

fn validate_recommendation(recommendation: &RecommendationConfig) -> Result<(), ConfigError> {
    if recommendation.ai_timeout_secs == 0 || recommendation.ai_timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "recommendation.ai_timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if recommendation.max_items == 0 || recommendation.max_items > 10 {
        return Err(ConfigError::Validation(
            "recommendation.max_items must be in range 1..=10".to_string(),
        ));
    }

    if recommendation.fallback_items == 0
        || recommendation.fallback_items > recommendation.max_items
    {
        return Err(ConfigError::Validation(
            "recommendation.fallback_items must be between 1 and recommendation.max_items"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_matching(matching: &MatchingConfig) -> Result<(), ConfigError> {
    if matching.default_categories.iter().all(|category| category.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "matching.default_categories must name at least one category".to_string(),
        ));
    }

    matching.rule_table().map(|_| ())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    catalog: Option<CatalogPatch>,
    recommendation: Option<RecommendationPatch>,
    matching: Option<MatchingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    display_currency: Option<String>,
    price_multiplier: Option<Decimal>,
    search_limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    ai_timeout_secs: Option<u64>,
    max_items: Option<usize>,
    fallback_items: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchingPatch {
    default_categories: Option<Vec<String>>,
    rules: Option<Vec<RuleSpec>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
