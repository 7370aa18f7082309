use std::sync::Arc;

use intake_core::config::{AppConfig, ConfigError};
use intake_core::Authenticator;
use intake_db::{connect_with_config, migrations, DbPool, SqlOrderRepository};
use intake_notify::NotifyError;
use thiserror::Error;
use tracing::info;

use crate::intake::IntakeContext;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub context: IntakeContext,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("notifier setup failed: {0}")]
    Notifier(#[source] NotifyError),
}

#[cfg(test)]
pub async fn bootstrap(
    options: intake_core::config::LoadOptions,
) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let notifier = intake_notify::from_config(&config.notifier).map_err(BootstrapError::Notifier)?;
    info!(
        event_name = "system.bootstrap.notifier_ready",
        correlation_id = "bootstrap",
        sink = notifier.sink_name(),
        "order notifier initialized"
    );

    let context = IntakeContext {
        orders: Arc::new(SqlOrderRepository::new(db_pool.clone())),
        notifier,
        authenticator: Authenticator::from_config(&config.auth),
    };

    Ok(Application { config, db_pool, context })
}

#[cfg(test)]
mod tests {
    use intake_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn options(database_url: &str, api_key: Option<&str>) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                api_key: api_key.map(str::to_string),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_api_key() {
        let result = bootstrap(options("sqlite::memory:", Some(""))).await;

        let message = result.err().expect("missing key must fail").to_string();
        assert!(message.contains("auth.api_key"), "unexpected message: {message}");
    }

    #[tokio::test]
    async fn bootstrap_applies_schema_and_selects_noop_notifier() {
        let app = bootstrap(options("sqlite::memory:?cache=shared", Some("bootstrap-key")))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'orders'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema lookup");
        assert_eq!(table_count, 1);
        assert!(app.context.notifier.is_noop());
        assert_eq!(app.context.authenticator.verify(Some("bootstrap-key")), Ok(()));
        assert_eq!(app.context.orders.count().await.expect("count"), 0);

        app.db_pool.close().await;
    }
}
