//! Staff user repository.

use sqlx::PgPool;

use sonic_core::UserId;

use super::{RepositoryError, expect_row};
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = r"
    id, username::TEXT AS username, email::TEXT AS email, password_hash, role,
    created_at, updated_at
";

/// Repository for staff user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All staff users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(self.pool).await?;
        Ok(users)
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Find a user by username or email, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1::CITEXT OR email = $1::CITEXT"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(identifier)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Insert a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(user.email.as_str())
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "username or email already exists"))
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this id.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        expect_row(result.rows_affected())
    }
}
