use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use pillsprint_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use crate::commands::{load_config, CommandResult};

/// Where a displayed value may have come from, highest precedence first.
struct FieldSources<'a> {
    flag: bool,
    env_keys: &'a [&'a str],
}

impl<'a> FieldSources<'a> {
    fn env(env_keys: &'a [&'a str]) -> Self {
        Self { flag: false, env_keys }
    }

    fn flag_or_env(flag: bool, env_keys: &'a [&'a str]) -> Self {
        Self { flag, env_keys }
    }
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = detect_config_path(options.config_path.as_deref());
    let overrides = options.overrides.clone();
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let file = (config_file_doc.as_ref(), config_file_path.as_deref());

    let fields: Vec<(&str, String, FieldSources)> = vec![
        (
            "database.url",
            config.database.url.clone(),
            FieldSources::flag_or_env(
                overrides.database_url.is_some(),
                &["PILLSPRINT_DATABASE_URL"],
            ),
        ),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            FieldSources::env(&["PILLSPRINT_DATABASE_MAX_CONNECTIONS"]),
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            FieldSources::env(&["PILLSPRINT_DATABASE_TIMEOUT_SECS"]),
        ),
        (
            "llm.provider",
            config.llm.provider.as_str().to_string(),
            FieldSources::flag_or_env(
                overrides.llm_provider.is_some(),
                &["PILLSPRINT_LLM_PROVIDER"],
            ),
        ),
        (
            "llm.model",
            config.llm.resolved_model(),
            FieldSources::flag_or_env(overrides.llm_model.is_some(), &["PILLSPRINT_LLM_MODEL"]),
        ),
        (
            "llm.base_url",
            config.llm.resolved_base_url(),
            FieldSources::env(&["PILLSPRINT_LLM_BASE_URL"]),
        ),
        (
            "llm.api_key",
            redact_key(config.llm.api_key.as_ref()),
            FieldSources::flag_or_env(overrides.llm_api_key.is_some(), &["PILLSPRINT_LLM_API_KEY"]),
        ),
        (
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            FieldSources::env(&["PILLSPRINT_LLM_TIMEOUT_SECS"]),
        ),
        (
            "catalog.display_currency",
            config.catalog.display_currency.clone(),
            FieldSources::env(&["PILLSPRINT_CATALOG_DISPLAY_CURRENCY"]),
        ),
        (
            "catalog.price_multiplier",
            config.catalog.price_multiplier.to_string(),
            FieldSources::env(&["PILLSPRINT_CATALOG_PRICE_MULTIPLIER"]),
        ),
        (
            "recommendation.ai_timeout_secs",
            config.recommendation.ai_timeout_secs.to_string(),
            FieldSources::flag_or_env(
                overrides.ai_timeout_secs.is_some(),
                &["PILLSPRINT_RECOMMENDATION_AI_TIMEOUT_SECS"],
            ),
        ),
        (
            "recommendation.max_items",
            config.recommendation.max_items.to_string(),
            FieldSources::env(&["PILLSPRINT_RECOMMENDATION_MAX_ITEMS"]),
        ),
        (
            "matching.rules",
            format!("{} extra", config.matching.rules.len()),
            FieldSources::env(&[]),
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            FieldSources::flag_or_env(
                overrides.log_level.is_some(),
                &["PILLSPRINT_LOGGING_LEVEL", "PILLSPRINT_LOG_LEVEL"],
            ),
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            FieldSources::env(&["PILLSPRINT_LOGGING_FORMAT", "PILLSPRINT_LOG_FORMAT"]),
        ),
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for (key, value, sources) in &fields {
        lines.push(render_line(key, value, field_source(key, sources, file)));
    }
    CommandResult::rendered(lines.join("\n"))
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    sources: &FieldSources,
    (config_file_doc, config_file_path): (Option<&Value>, Option<&Path>),
) -> String {
    if sources.flag {
        return "flag".to_string();
    }
    if let Some(env_key) = sources.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Shows only the last four characters of keys long enough to keep them secret.
fn redact_key(key: Option<&SecretString>) -> String {
    let Some(key) = key else {
        return "<unset>".to_string();
    };
    let trimmed = key.expose_secret().trim();
    let chars = trimmed.chars().count();
    if chars < 12 {
        return "<redacted>".to_string();
    }
    let suffix: String = trimmed.chars().skip(chars - 4).collect();
    format!("<redacted>...{suffix}")
}
