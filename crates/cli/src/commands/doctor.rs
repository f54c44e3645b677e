use pillsprint_core::config::{AppConfig, LlmProvider, LoadOptions};
use pillsprint_db::{connect_with_settings, ping, SqlCatalogRepository};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::{to_pretty_json, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn new(name: &'static str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self { name, status, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Readiness report. Failing checks are reported in the output, not the exit code.
pub fn run(options: LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let output = if json_output { to_pretty_json(&report) } else { render_human(&report) };
    CommandResult::rendered(output)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck::new(
                "config_validation",
                CheckStatus::Pass,
                "configuration loaded and validated",
            ));
            checks.push(check_llm_provider(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            let details = error.to_string();
            checks.push(DoctorCheck::new("config_validation", CheckStatus::Fail, details));
            for name in ["llm_provider", "database_connectivity", "catalog_inventory"] {
                checks.push(DoctorCheck::new(
                    name,
                    CheckStatus::Skipped,
                    "skipped because configuration did not load",
                ));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Only checks what can be known without calling the provider.
fn check_llm_provider(config: &AppConfig) -> DoctorCheck {
    let llm = &config.llm;
    match llm.provider {
        LlmProvider::Disabled => DoctorCheck::new(
            "llm_provider",
            CheckStatus::Pass,
            "disabled: recommendations use keyword matching only",
        ),
        LlmProvider::Gemini => {
            let has_key = llm
                .api_key
                .as_ref()
                .is_some_and(|key| !key.expose_secret().trim().is_empty());
            if has_key {
                DoctorCheck::new(
                    "llm_provider",
                    CheckStatus::Pass,
                    format!("gemini model `{}` with api key configured", llm.resolved_model()),
                )
            } else {
                DoctorCheck::new("llm_provider", CheckStatus::Fail, "gemini requires llm.api_key")
            }
        }
        LlmProvider::Ollama => DoctorCheck::new(
            "llm_provider",
            CheckStatus::Pass,
            format!("ollama model `{}` at {}", llm.resolved_model(), llm.resolved_base_url()),
        ),
    }
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![DoctorCheck::new(
                "database_connectivity",
                CheckStatus::Fail,
                format!("failed to initialize async runtime: {error}"),
            )];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::new(
                        "database_connectivity",
                        CheckStatus::Fail,
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::new(
                        "catalog_inventory",
                        CheckStatus::Skipped,
                        "skipped because the database is unreachable",
                    ),
                ];
            }
        };

        let mut checks = Vec::new();
        match ping(&pool).await {
            Ok(()) => checks.push(DoctorCheck::new(
                "database_connectivity",
                CheckStatus::Pass,
                format!("connected using `{}`", config.database.url),
            )),
            Err(error) => checks.push(DoctorCheck::new(
                "database_connectivity",
                CheckStatus::Fail,
                format!("database did not answer ping: {error}"),
            )),
        }

        let inventory = match SqlCatalogRepository::new(pool.clone()).count().await {
            Ok(0) => DoctorCheck::new(
                "catalog_inventory",
                CheckStatus::Fail,
                "catalog is empty; run `pillsprint seed` to load the demo catalog",
            ),
            Ok(count) => DoctorCheck::new(
                "catalog_inventory",
                CheckStatus::Pass,
                format!("{count} medicines available"),
            ),
            Err(error) => DoctorCheck::new(
                "catalog_inventory",
                CheckStatus::Fail,
                format!("catalog unreadable ({error}); run `pillsprint migrate`"),
            ),
        };
        checks.push(inventory);

        pool.close().await;
        checks
    })
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
