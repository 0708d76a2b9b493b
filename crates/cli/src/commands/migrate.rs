//! Database migration command.
//!
//! Migrations live in the workspace `migrations/` directory and are
//! embedded at compile time. Both services share one database, so there
//! is a single migration set.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `MigrationError` if `DATABASE_URL` is unset, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = super::connect()
        .await
        .ok_or(MigrationError::MissingEnvVar("DATABASE_URL"))??;

    let migrator = sqlx::migrate!("../../migrations");
    tracing::info!(available = migrator.iter().count(), "Running migrations...");

    migrator.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
