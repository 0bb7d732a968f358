use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let db = DatabaseManager::from_config(&config::config().database)?;
    let result = db.migrate().await;
    db.close().await;

    match result {
        Ok(()) => output_success(output_format, "Migrations applied", None),
        Err(e) => {
            output_error(output_format, &e.to_string(), Some("MIGRATION_FAILED"))?;
            Err(e.into())
        }
    }
}
