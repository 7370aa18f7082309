use intake_core::config::{AppConfig, LoadOptions};
use intake_db::{connect_with_config, migrations, OrderRepository, SqlOrderRepository};

use crate::commands::{
    current_thread_runtime, CommandResult, EXIT_CONFIG, EXIT_DATABASE, EXIT_MIGRATION,
    EXIT_RUNTIME,
};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(message) => {
            return CommandResult::failure("migrate", "runtime_init", message, EXIT_RUNTIME);
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DATABASE))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;
        let stored = SqlOrderRepository::new(pool.clone())
            .count()
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;
        pool.close().await;
        Ok::<i64, (&'static str, String, u8)>(stored)
    });

    match result {
        Ok(stored) => CommandResult::success(
            "migrate",
            format!("applied pending migrations; orders table holds {stored} row(s)"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
