//! Catalog browsing: `search`, `show` and `emergency`.

use pillsprint_core::catalog::PriceConverter;
use pillsprint_core::config::LoadOptions;
use pillsprint_core::domain::medicine::{MedicineId, MedicineRecord};

use crate::commands::bootstrap::bootstrap;
use crate::commands::{execute, load_config, to_pretty_json, CommandResult};

pub fn search(options: LoadOptions, text: &str, json_output: bool) -> CommandResult {
    let config = match load_config("search", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    execute("search", async move {
        let app = bootstrap(config).await?;
        let result = match app.agent.search(text).await {
            Ok(records) if json_output => CommandResult::rendered(to_pretty_json(&records)),
            Ok(records) if records.is_empty() => {
                CommandResult::rendered(format!("no medicines match `{}`", text.trim()))
            }
            Ok(records) => CommandResult::rendered(render_list(&records, &app.price_converter())),
            Err(error) => CommandResult::catalog_failure("search", &error),
        };
        app.shutdown().await;
        Ok(result)
    })
}

pub fn show(options: LoadOptions, id: &str, json_output: bool) -> CommandResult {
    let config = match load_config("show", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    execute("show", async move {
        let app = bootstrap(config).await?;
        let result = match app.agent.get_by_id(&MedicineId::new(id)).await {
            Ok(record) if json_output => CommandResult::rendered(to_pretty_json(&record)),
            Ok(record) => CommandResult::rendered(render_detail(&record, &app.price_converter())),
            Err(error) => CommandResult::catalog_failure("show", &error),
        };
        app.shutdown().await;
        Ok(result)
    })
}

pub fn emergency(options: LoadOptions, json_output: bool) -> CommandResult {
    let config = match load_config("emergency", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    execute("emergency", async move {
        let app = bootstrap(config).await?;
        let result = match app.agent.list_emergency().await {
            Ok(records) if json_output => CommandResult::rendered(to_pretty_json(&records)),
            Ok(records) if records.is_empty() => {
                CommandResult::rendered("no emergency medicines are stocked")
            }
            Ok(records) => CommandResult::rendered(render_list(&records, &app.price_converter())),
            Err(error) => CommandResult::catalog_failure("emergency", &error),
        };
        app.shutdown().await;
        Ok(result)
    })
}

fn render_list(records: &[MedicineRecord], prices: &PriceConverter) -> String {
    records
        .iter()
        .map(|record| {
            let flag = if record.emergency { " [emergency]" } else { "" };
            let stock = if record.in_stock() {
                format!("{} in stock", record.stock)
            } else {
                "out of stock".to_string()
            };
            format!(
                "- {} | {} | {} | {} | {stock}{flag}",
                record.id,
                record.name,
                record.category,
                prices.format(record.price)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_detail(record: &MedicineRecord, prices: &PriceConverter) -> String {
    let mut lines = vec![
        format!("{} ({})", record.name, record.id),
        format!("category: {}", record.category),
        format!("price: {}", prices.format(record.price)),
        format!("stock: {}", record.stock),
    ];
    if record.emergency {
        lines.push("emergency: yes".to_string());
    }
    if record.requires_prescription {
        lines.push("prescription required".to_string());
    }
    let optional = [
        ("manufacturer", &record.manufacturer),
        ("dosage form", &record.dosage_form),
        ("strength", &record.strength),
        ("package", &record.package_size),
        ("usage", &record.usage_instructions),
        ("storage", &record.storage_instructions),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            lines.push(format!("{label}: {value}"));
        }
    }
    let lists = [
        ("composition", &record.composition),
        ("alternatives", &record.alternatives),
        ("side effects", &record.side_effects),
        ("warnings", &record.warnings),
    ];
    for (label, values) in lists {
        if !values.is_empty() {
            lines.push(format!("{label}: {}", values.join(", ")));
        }
    }
    if !record.description.is_empty() {
        lines.push(String::new());
        lines.push(record.description.clone());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use pillsprint_core::catalog::PriceConverter;
    use pillsprint_core::domain::medicine::MedicineRow;

    use super::{render_detail, render_list};

    #[test]
    fn list_marks_stock_and_emergency() {
        let prices = PriceConverter::new(Decimal::ONE, "USD");
        let mut inhaler = MedicineRow::new("m2", "Salbutamol Inhaler", "Respiratory", Decimal::TEN);
        inhaler.emergency = Some(true);
        inhaler.stock = Some(3);
        let records = vec![
            prices.normalize(MedicineRow::new("m1", "Eye Drops", "Eye Care", Decimal::ONE)),
            prices.normalize(inhaler),
        ];

        let output = render_list(&records, &prices);

        assert_eq!(
            output,
            "- m1 | Eye Drops | Eye Care | $1 | out of stock\n\
             - m2 | Salbutamol Inhaler | Respiratory | $10 | 3 in stock [emergency]"
        );
    }

    #[test]
    fn detail_skips_missing_fields() {
        let prices = PriceConverter::default();
        let mut row = MedicineRow::new("m1", "Paracetamol 500mg", "Pain Relief", Decimal::ONE);
        row.composition = Some(vec!["Paracetamol 500mg".to_string()]);
        let output = render_detail(&prices.normalize(row), &prices);

        assert!(output.starts_with("Paracetamol 500mg (m1)"));
        assert!(output.contains("price: ₹83"));
        assert!(output.contains("composition: Paracetamol 500mg"));
        assert!(!output.contains("manufacturer"));
    }
}
