//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect to `DATABASE_URL`, loading `.env` first.
///
/// Returns `None` when the variable is unset.
async fn connect() -> Option<Result<PgPool, sqlx::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").ok().map(SecretString::from)?;

    tracing::info!("Connecting to database...");
    Some(sonic_admin::db::create_pool(&database_url).await)
}
