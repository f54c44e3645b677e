use std::sync::Arc;

use pillsprint_agent::AgentRuntime;
use pillsprint_core::catalog::PriceConverter;
use pillsprint_core::config::{AppConfig, ConfigError};
use pillsprint_db::{connect_with_settings, migrations, DbPool, SqlCatalogRepository};
use thiserror::Error;
use tracing::info;

/// A migrated pool plus the agent runtime wired to it.
pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: Arc<SqlCatalogRepository>,
    pub agent: AgentRuntime,
}

impl Application {
    pub fn price_converter(&self) -> PriceConverter {
        price_converter(&self.config)
    }

    pub async fn shutdown(self) {
        self.db_pool.close().await;
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("agent runtime could not be built: {0}")]
    Agent(String),
}

impl BootstrapError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_validation",
            Self::DatabaseConnect(_) => "db_connectivity",
            Self::Migration(_) => "migration",
            Self::Agent(_) => "agent_init",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Agent(_) => 2,
            Self::DatabaseConnect(_) => 4,
            Self::Migration(_) => 5,
        }
    }
}

pub fn price_converter(config: &AppConfig) -> PriceConverter {
    PriceConverter::new(config.catalog.price_multiplier, config.catalog.display_currency.clone())
}

/// Connects and applies pending migrations.
pub async fn open_database(config: &AppConfig) -> Result<DbPool, BootstrapError> {
    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");
    Ok(db_pool)
}

pub async fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        provider = config.llm.provider.as_str(),
        "starting application bootstrap"
    );
    let db_pool = open_database(&config).await?;

    let catalog = Arc::new(
        SqlCatalogRepository::new(db_pool.clone())
            .with_converter(price_converter(&config))
            .with_search_limit(config.catalog.search_limit as usize),
    );
    let agent = AgentRuntime::from_config(&config, catalog.clone())
        .map_err(|error| BootstrapError::Agent(format!("{error:#}")))?;

    Ok(Application { config, db_pool, catalog, agent })
}
