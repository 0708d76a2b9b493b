//! Contact form persistence.

use sqlx::PgPool;

use sonic_core::LeadId;

use super::RepositoryError;
use crate::models::NewLead;

/// Repository for lead inserts.
pub struct LeadRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LeadRepository<'a> {
    /// Create a new lead repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new lead with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, lead: &NewLead) -> Result<LeadId, RepositoryError> {
        let id = sqlx::query_scalar::<_, LeadId>(
            r"
            INSERT INTO leads (name, email, phone, company, message, source)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&lead.name)
        .bind(lead.email.as_str())
        .bind(lead.phone.as_ref().map(sonic_core::Phone::as_str))
        .bind(lead.company.as_deref())
        .bind(&lead.message)
        .bind(lead.source.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }
}
