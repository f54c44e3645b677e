use crate::commands::bootstrap::open_database;
use crate::commands::{execute, load_config, CommandResult};
use pillsprint_core::config::LoadOptions;
use pillsprint_db::{DemoCatalog, SeedResult};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    execute("seed", async move {
        let pool = open_database(&config).await?;

        let seeded = match DemoCatalog::load(&pool).await {
            Ok(seeded) => seeded,
            Err(error) => {
                pool.close().await;
                return Ok(CommandResult::failure("seed", "seed_execution", error.to_string(), 5));
            }
        };

        let result = match DemoCatalog::verify(&pool).await {
            Ok(verification) if verification.all_passed => {
                CommandResult::success("seed", seed_message(&seeded))
            }
            Ok(verification) => {
                let failed = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(*check))
                    .collect::<Vec<_>>();
                let message = verification_message(&failed);
                CommandResult::failure("seed", "seed_verification", message, 6)
            }
            Err(error) => CommandResult::failure("seed", "seed_verification", error.to_string(), 6),
        };

        pool.close().await;
        Ok(result)
    })
}

fn seed_message(seeded: &SeedResult) -> String {
    let categories: Vec<String> =
        seeded.categories.iter().map(|category| format!("  - {category}")).collect();
    format!(
        "demo catalog loaded: {} medicines across {} categories:\n{}",
        seeded.medicines_seeded,
        seeded.categories.len(),
        categories.join("\n")
    )
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use pillsprint_db::SeedResult;

    use super::{seed_message, verification_message};

    #[test]
    fn verification_error_message_targets_failed_checks() {
        assert_eq!(
            verification_message(&["med-aspirin-chewable", "med-ors-sachet"]),
            "Seed verification failed for checks: med-aspirin-chewable, med-ors-sachet"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_message(&[]), "Some seed data failed to load");
    }

    #[test]
    fn seed_message_lists_categories() {
        let seeded = SeedResult { medicines_seeded: 2, categories: vec!["Allergy", "Emergency"] };

        assert_eq!(
            seed_message(&seeded),
            "demo catalog loaded: 2 medicines across 2 categories:\n  - Allergy\n  - Emergency"
        );
    }
}
