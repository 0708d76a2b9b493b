//! Order management queries.

use sqlx::PgPool;

use sonic_core::OrderId;

use super::{RepositoryError, expect_row};
use crate::models::{Order, OrderFilter, Page, StatusUpdate};

const ORDER_COLUMNS: &str = r"
    id, order_number, customer_name, customer_email::TEXT AS customer_email, customer_phone,
    shipping_address, billing_address, product_id, category_id, product_name, quantity,
    unit_price, subtotal, gst, shipping_fee, discount, coupon_code, payment_adjustment, total,
    payment_method, order_status, payment_status, razorpay_order_id, razorpay_payment_id,
    reward, created_at, updated_at
";

const FILTER_CLAUSE: &str = r"
    ($1::order_status IS NULL OR order_status = $1)
    AND ($2::payment_status IS NULL OR payment_status = $2)
";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of orders matching the filter, newest first, and the
    /// number of matching orders overall.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(&self, filter: OrderFilter, page: Page) -> Result<(Vec<Order>, i64), RepositoryError> {
        let sql = format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE {FILTER_CLAUSE}
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        );

        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(filter.order_status)
            .bind(filter.payment_status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders WHERE {FILTER_CLAUSE}"))
            .bind(filter.order_status)
            .bind(filter.payment_status)
            .fetch_one(self.pool)
            .await?;

        Ok((orders, total))
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }

    /// Set the order and/or payment status. Unset fields keep their value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(&self, id: OrderId, update: StatusUpdate) -> Result<Order, RepositoryError> {
        let sql = format!(
            r"
            UPDATE orders
            SET order_status = COALESCE($2, order_status),
                payment_status = COALESCE($3, payment_status)
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        );

        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(update.order_status)
            .bind(update.payment_status)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        expect_row(result.rows_affected())
    }
}
