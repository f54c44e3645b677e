//! `analyze` and `compare`. Both print the outcome as JSON; anything other than
//! a structured answer exits 6.

use pillsprint_agent::InsightOutcome;
use pillsprint_core::config::LoadOptions;
use serde::Serialize;

use crate::commands::bootstrap::bootstrap;
use crate::commands::{execute, load_config, to_pretty_json, CommandResult};

pub fn analyze(
    options: LoadOptions,
    composition: &str,
    condition: Option<&str>,
) -> CommandResult {
    let config = match load_config("analyze", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    execute("analyze", async move {
        let app = bootstrap(config).await?;
        let outcome = app.agent.analyze_composition(composition, condition).await;
        app.shutdown().await;
        Ok(outcome_result(&outcome))
    })
}

pub fn compare(options: LoadOptions, name: &str, composition: Option<&str>) -> CommandResult {
    let config = match load_config("compare", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    execute("compare", async move {
        let app = bootstrap(config).await?;
        let outcome = app.agent.compare_options(name, composition).await;
        app.shutdown().await;
        Ok(outcome_result(&outcome))
    })
}

fn outcome_result<T: Serialize>(outcome: &InsightOutcome<T>) -> CommandResult {
    let exit_code = if outcome.is_structured() { 0 } else { 6 };
    CommandResult { exit_code, output: to_pretty_json(outcome) }
}
