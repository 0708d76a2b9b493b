//! Deal and coupon code repository.

use sqlx::PgPool;

use sonic_core::DealId;

use super::{RepositoryError, expect_row};
use crate::models::{Deal, DealInput};

const DEAL_COLUMNS: &str = r"
    d.id, d.title, d.description, d.product_id, p.name AS product_name,
    d.coupon_code::TEXT AS coupon_code, d.deal_price, d.starts_at, d.expires_at,
    d.is_active, d.created_at, d.updated_at
";

const DUPLICATE_CODE: &str = "a deal with this coupon code already exists";

/// Repository for deal database operations.
pub struct DealRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DealRepository<'a> {
    /// Create a new deal repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All deals, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Deal>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {DEAL_COLUMNS}
            FROM deals d
            LEFT JOIN products p ON p.id = d.product_id
            ORDER BY d.created_at DESC, d.id DESC
            "
        );
        let deals = sqlx::query_as::<_, Deal>(&sql).fetch_all(self.pool).await?;
        Ok(deals)
    }

    /// Get a deal by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: DealId) -> Result<Option<Deal>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {DEAL_COLUMNS}
            FROM deals d
            LEFT JOIN products p ON p.id = d.product_id
            WHERE d.id = $1
            "
        );
        let deal = sqlx::query_as::<_, Deal>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(deal)
    }

    /// Insert a deal.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the coupon code is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &DealInput) -> Result<Deal, RepositoryError> {
        let id: DealId = sqlx::query_scalar(
            r"
            INSERT INTO deals (
                title, description, product_id, coupon_code, deal_price,
                starts_at, expires_at, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(&input.title)
        .bind(input.description.as_deref())
        .bind(input.product_id)
        .bind(&input.coupon_code)
        .bind(input.deal_price)
        .bind(input.starts_at)
        .bind(input.expires_at)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, DUPLICATE_CODE))?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace a deal's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no deal has this id.
    /// Returns `RepositoryError::Conflict` if the coupon code is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, id: DealId, input: &DealInput) -> Result<Deal, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE deals
            SET title = $2, description = $3, product_id = $4, coupon_code = $5,
                deal_price = $6, starts_at = $7, expires_at = $8, is_active = $9
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.title)
        .bind(input.description.as_deref())
        .bind(input.product_id)
        .bind(&input.coupon_code)
        .bind(input.deal_price)
        .bind(input.starts_at)
        .bind(input.expires_at)
        .bind(input.is_active)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, DUPLICATE_CODE))?;

        expect_row(result.rows_affected())?;
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a deal.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no deal has this id.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: DealId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM deals WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        expect_row(result.rows_affected())
    }
}
