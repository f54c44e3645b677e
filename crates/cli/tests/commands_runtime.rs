use std::env;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use pillsprint_cli::commands::{catalog, chat, config, doctor, insights, migrate, recommend, seed};
use pillsprint_core::config::{ConfigOverrides, LlmProvider, LoadOptions};
use serde_json::Value;

#[test]
fn migrate_returns_success_on_fresh_database() {
    with_database(|options| {
        let result = migrate::run(options);
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_gemini_without_key() {
    with_env(&[("PILLSPRINT_LLM_PROVIDER", "gemini")], || {
        let result = migrate::run(LoadOptions::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn migrate_reports_unreachable_database() {
    with_env(&[("PILLSPRINT_DATABASE_TIMEOUT_SECS", "1")], || {
        let options = offline_options("sqlite:///pillsprint-missing-dir/nested/catalog.db");

        let result = migrate::run(options);

        assert_eq!(result.exit_code, 4);
        assert_eq!(parse_payload(&result.output)["error_class"], "db_connectivity");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_database(|options| {
        let first = seed::run(options.clone());
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["command"], "seed");
        assert!(first_payload["message"]
            .as_str()
            .unwrap_or_default()
            .starts_with("demo catalog loaded: 18 medicines"));

        let second = seed::run(options);
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        assert_eq!(first_payload["message"], parse_payload(&second.output)["message"]);
    });
}

#[test]
fn recommend_falls_back_to_keyword_matching_offline() {
    with_seeded_database(|options| {
        let result = recommend::run(options, "I have a severe headache", true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["is_fallback"], true);
        assert!(!payload["emergency_note"].is_null(), "severe symptoms carry a note");
        assert!(!payload["disclaimer"].as_str().unwrap_or_default().is_empty());

        let items = payload["items"].as_array().expect("items array");
        assert!(!items.is_empty() && items.len() <= 5);
        assert_eq!(items[0]["emergency"], true, "emergency items rank first");
        let ids: Vec<&str> = items.iter().filter_map(|item| item["id"].as_str()).collect();
        assert!(ids.contains(&"med-paracetamol-500") || ids.contains(&"med-ibuprofen-400"));
    });
}

#[test]
fn recommend_skips_out_of_stock_category_matches() {
    with_seeded_database(|options| {
        let result = recommend::run(options, "dry eyes and eye strain", true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let items = payload["items"].as_array().expect("items array");
        assert!(items.iter().all(|item| item["category"] != "Eye Care"));
    });
}

#[test]
fn recommend_blank_input_asks_to_rephrase() {
    with_database(|options| {
        let result = recommend::run(options, "   ", false);

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("Please describe your symptoms"));
    });
}

#[test]
fn search_lists_seeded_medicines() {
    with_seeded_database(|options| {
        let result = catalog::search(options, "paracetamol", false);

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("med-paracetamol-500 | Paracetamol 500mg"));
    });
}

#[test]
fn search_without_matches_says_so() {
    with_seeded_database(|options| {
        let result = catalog::search(options, "zzz-no-such-medicine", false);

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "no medicines match `zzz-no-such-medicine`");
    });
}

#[test]
fn show_returns_record_json() {
    with_seeded_database(|options| {
        let result = catalog::show(options, "med-salbutamol-inhaler", true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["name"], "Salbutamol Inhaler");
        assert_eq!(payload["emergency"], true);
    });
}

#[test]
fn show_unknown_id_exits_not_found() {
    with_seeded_database(|options| {
        let result = catalog::show(options, "med-unknown", false);
        assert_eq!(result.exit_code, 7);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "show");
        assert_eq!(payload["error_class"], "not_found");
    });
}

#[test]
fn emergency_lists_only_emergency_items() {
    with_seeded_database(|options| {
        let result = catalog::emergency(options, true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let records = payload.as_array().expect("records array");
        assert!(!records.is_empty());
        assert!(records.iter().all(|record| record["emergency"] == true));
    });
}

#[test]
fn analyze_reports_failure_without_provider() {
    with_seeded_database(|options| {
        let result = insights::analyze(options, "Paracetamol 500mg", Some("fever"));
        assert_eq!(result.exit_code, 6);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["kind"], "failed");
        assert_eq!(payload["error"], "Failed to analyze composition");
    });
}

#[test]
fn compare_reports_failure_without_provider() {
    with_seeded_database(|options| {
        let result = insights::compare(options, "Paracetamol 500mg", None);
        assert_eq!(result.exit_code, 6);

        assert_eq!(parse_payload(&result.output)["kind"], "failed");
    });
}

#[test]
fn chat_without_provider_apologizes() {
    with_seeded_database(|options| {
        let result = chat::run(options, "What helps with a cold?", None);

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("trouble connecting"));
    });
}

#[test]
fn chat_rejects_missing_history_file() {
    with_database(|options| {
        let result = chat::run(options, "hello", Some(Path::new("/no/such/history.json")));

        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_history");
    });
}

#[test]
fn doctor_passes_after_seed() {
    with_seeded_database(|options| {
        let result = doctor::run(options, true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        let names: Vec<&str> = payload["checks"]
            .as_array()
            .expect("checks array")
            .iter()
            .filter_map(|check| check["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec!["config_validation", "llm_provider", "database_connectivity", "catalog_inventory"]
        );
    });
}

#[test]
fn doctor_flags_unmigrated_catalog() {
    with_database(|options| {
        let payload = parse_payload(&doctor::run(options, true).output);

        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][3]["name"], "catalog_inventory");
        assert_eq!(payload["checks"][3]["status"], "fail");
    });
}

#[test]
fn config_redacts_api_key_and_names_sources() {
    with_env(
        &[
            ("PILLSPRINT_LLM_PROVIDER", "gemini"),
            ("PILLSPRINT_LLM_API_KEY", "AIzaSyExampleKey9876"),
        ],
        || {
            let result = config::run(LoadOptions::default());
            assert_eq!(result.exit_code, 0);

            assert!(!result.output.contains("AIzaSyExampleKey9876"));
            let api_key_line =
                "- llm.api_key = <redacted>...9876 (source: env (PILLSPRINT_LLM_API_KEY))";
            assert!(result.output.contains(api_key_line));
            assert!(result.output.contains("- llm.provider = gemini (source: env"));
            assert!(result.output.contains("- recommendation.max_items = 5 (source: default)"));
        },
    );
}

fn offline_options(database_url: &str) -> LoadOptions {
    LoadOptions {
        overrides: ConfigOverrides {
            database_url: Some(database_url.to_string()),
            llm_provider: Some(LlmProvider::Disabled),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    }
}

/// Runs `test_fn` against a fresh sqlite file with the model disabled.
fn with_database(test_fn: impl FnOnce(LoadOptions)) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("pillsprint.db").display());
    with_env(&[], || test_fn(offline_options(&url)));
}

fn with_seeded_database(test_fn: impl FnOnce(LoadOptions)) {
    with_database(|options| {
        let seeded = seed::run(options.clone());
        assert_eq!(seeded.exit_code, 0, "seed failed: {}", seeded.output);
        test_fn(options);
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PILLSPRINT_DATABASE_URL",
        "PILLSPRINT_DATABASE_MAX_CONNECTIONS",
        "PILLSPRINT_DATABASE_TIMEOUT_SECS",
        "PILLSPRINT_LLM_PROVIDER",
        "PILLSPRINT_LLM_API_KEY",
        "PILLSPRINT_LLM_BASE_URL",
        "PILLSPRINT_LLM_MODEL",
        "PILLSPRINT_LLM_TIMEOUT_SECS",
        "PILLSPRINT_CATALOG_PRICE_MULTIPLIER",
        "PILLSPRINT_CATALOG_DISPLAY_CURRENCY",
        "PILLSPRINT_RECOMMENDATION_AI_TIMEOUT_SECS",
        "PILLSPRINT_RECOMMENDATION_MAX_ITEMS",
        "PILLSPRINT_LOGGING_LEVEL",
        "PILLSPRINT_LOGGING_FORMAT",
        "PILLSPRINT_LOG_LEVEL",
        "PILLSPRINT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
