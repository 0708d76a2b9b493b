//! Staff user management commands.
//!
//! `user create` is how the first admin gets in: the API only lets an
//! existing admin create accounts.

use sonic_admin::db::UserRepository;
use sonic_admin::services::AuthService;
use sonic_admin::services::auth::CreateUser;
use sonic_core::UserRole;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid role: {0}. Valid roles: viewer, editor, admin")]
    InvalidRole(String),

    #[error(transparent)]
    Auth(#[from] sonic_admin::services::AuthError),

    #[error(transparent)]
    Repository(#[from] sonic_admin::db::RepositoryError),
}

/// Create a staff user.
///
/// # Errors
///
/// Returns `UserError` for an unknown role, input the admin API would also
/// reject, a duplicate username or email, or a database failure.
pub async fn create(username: &str, email: &str, role: &str, password: &str) -> Result<(), UserError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;

    let pool = super::connect()
        .await
        .ok_or(UserError::MissingEnvVar("DATABASE_URL"))??;

    tracing::info!("Creating staff user: {} ({})", username, role);

    let user = AuthService::new(&pool)
        .create_user(&CreateUser {
            username,
            email,
            password,
            role,
        })
        .await?;

    tracing::info!(
        "Staff user created successfully! ID: {}, Username: {}, Email: {}, Role: {}",
        user.id,
        user.username,
        user.email,
        user.role
    );
    Ok(())
}

/// Log every staff user.
///
/// # Errors
///
/// Returns `UserError` if the database is unreachable.
pub async fn list() -> Result<(), UserError> {
    let pool = super::connect()
        .await
        .ok_or(UserError::MissingEnvVar("DATABASE_URL"))??;

    let users = UserRepository::new(&pool).list().await?;

    tracing::info!("{} staff user(s)", users.len());
    for user in users {
        tracing::info!(
            "  {:>4}  {:<20} {:<32} {}",
            user.id,
            user.username,
            user.email,
            user.role
        );
    }
    Ok(())
}
