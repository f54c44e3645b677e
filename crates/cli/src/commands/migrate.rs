use crate::commands::bootstrap::open_database;
use crate::commands::{execute, load_config, CommandResult};
use pillsprint_core::config::LoadOptions;

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match load_config("migrate", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    execute("migrate", async move {
        let pool = open_database(&config).await?;
        pool.close().await;
        Ok(CommandResult::success("migrate", "applied pending migrations"))
    })
}
