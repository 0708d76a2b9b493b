//! Lead follow-up queries.

use sqlx::PgPool;

use sonic_core::{LeadId, LeadStatus};

use super::{RepositoryError, expect_row};
use crate::models::Lead;

const LEAD_COLUMNS: &str = r"
    id, name, email::TEXT AS email, phone, company, message, source, status,
    created_at, updated_at
";

/// Repository for lead database operations.
pub struct LeadRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LeadRepository<'a> {
    /// Create a new lead repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Leads, newest first, optionally limited to one status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {LEAD_COLUMNS}
            FROM leads
            WHERE ($1::lead_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "
        );
        let leads = sqlx::query_as::<_, Lead>(&sql)
            .bind(status)
            .fetch_all(self.pool)
            .await?;
        Ok(leads)
    }

    /// Get a lead by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1");
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(lead)
    }

    /// Move a lead to a new status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no lead has this id.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_status(&self, id: LeadId, status: LeadStatus) -> Result<Lead, RepositoryError> {
        let sql = format!("UPDATE leads SET status = $2 WHERE id = $1 RETURNING {LEAD_COLUMNS}");
        sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a lead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no lead has this id.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: LeadId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        expect_row(result.rows_affected())
    }
}
