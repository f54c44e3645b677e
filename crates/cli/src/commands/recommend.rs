use pillsprint_core::catalog::PriceConverter;
use pillsprint_core::config::LoadOptions;
use pillsprint_core::domain::recommendation::Recommendation;

use crate::commands::bootstrap::bootstrap;
use crate::commands::{execute, load_config, to_pretty_json, CommandResult};

pub fn run(options: LoadOptions, symptoms: &str, json_output: bool) -> CommandResult {
    let config = match load_config("recommend", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    execute("recommend", async move {
        let app = bootstrap(config).await?;
        let recommendation = app.agent.get_recommendations(symptoms).await;
        let output = if json_output {
            to_pretty_json(&recommendation)
        } else {
            render_human(&recommendation, &app.price_converter())
        };
        app.shutdown().await;
        Ok(CommandResult::rendered(output))
    })
}

fn render_human(recommendation: &Recommendation, prices: &PriceConverter) -> String {
    let mut lines = Vec::new();
    if let Some(note) = &recommendation.emergency_note {
        lines.push(format!("!! {note}"));
        lines.push(String::new());
    }
    lines.push(recommendation.analysis.clone());

    for (index, item) in recommendation.items.iter().enumerate() {
        let flag = if item.emergency { " [emergency]" } else { "" };
        lines.push(String::new());
        lines.push(format!(
            "{}. {} ({}, {}) {}{flag}",
            index + 1,
            item.name,
            item.category,
            item.dosage_form,
            prices.format(item.price)
        ));
        lines.push(format!("   why: {}", item.reason));
        lines.push(format!("   how it helps: {}", item.how_it_helps));
        lines.push(format!("   usage: {}", item.usage));
        lines.push(format!("   precautions: {}", item.precautions));
    }

    if let Some(advice) = &recommendation.general_advice {
        lines.push(String::new());
        lines.push(advice.clone());
    }
    lines.push(String::new());
    lines.push(recommendation.disclaimer.clone());
    if recommendation.is_fallback && !recommendation.items.is_empty() {
        lines.push("(matched by keyword; AI suggestions were unavailable)".to_string());
    }
    lines.join("\n")
}
