//! Order persistence for checkout, payment and reward spins.

use sqlx::PgPool;
use sqlx::types::Json;

use sonic_core::{Email, OrderId};

use super::RepositoryError;
use crate::models::{NewOrder, Order, generate_order_number};

/// Attempts at picking an unused order number before giving up.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";
const CHECKOUT_SESSION_CONSTRAINT: &str = "orders_checkout_session_id_key";

const ORDER_COLUMNS: &str = r"
    id, order_number, customer_name, customer_email::TEXT AS customer_email, customer_phone,
    shipping_address, billing_address, product_id, category_id, product_name, quantity,
    unit_price, subtotal, gst, shipping_fee, discount, coupon_code, payment_adjustment, total,
    payment_method, order_status, payment_status, razorpay_order_id, razorpay_payment_id,
    reward, created_at, updated_at
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

    /// Insert an order under a freshly generated order number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if no free order number was found,
    /// the checkout session already placed an order, or the product/category
    /// no longer exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let quantity = i32::try_from(order.quote.quantity)
            .map_err(|_| RepositoryError::DataCorruption("quantity out of range".to_owned()))?;

        let sql = format!(
            r"
            INSERT INTO orders (
                order_number, customer_name, customer_email, customer_phone,
                shipping_address, billing_address, product_id, category_id, product_name,
                quantity, unit_price, subtotal, gst, shipping_fee, discount, coupon_code,
                payment_adjustment, total, payment_method, order_status, payment_status,
                checkout_session_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22)
            RETURNING {ORDER_COLUMNS}
            "
        );

        let mut last_error = RepositoryError::Conflict("order number collision".to_owned());

        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            let order_number = generate_order_number(&mut rand::rng());

            let result = sqlx::query_as::<_, Order>(&sql)
                .bind(&order_number)
                .bind(&order.customer.name)
                .bind(order.customer.email.as_str())
                .bind(order.customer.phone.as_str())
                .bind(Json(&order.customer.shipping_address))
                .bind(Json(&order.customer.billing_address))
                .bind(order.product_id)
                .bind(order.category_id)
                .bind(&order.product_name)
                .bind(quantity)
                .bind(order.quote.unit_price)
                .bind(order.quote.subtotal)
                .bind(order.quote.gst)
                .bind(order.quote.shipping_fee)
                .bind(order.quote.discount)
                .bind(order.coupon_code.as_deref())
                .bind(order.quote.payment_adjustment)
                .bind(order.quote.total)
                .bind(order.quote.payment_method)
                .bind(order.order_status)
                .bind(order.payment_status)
                .bind(order.checkout_session_id)
                .fetch_one(self.pool)
                .await;

            match result {
                Ok(created) => return Ok(created),
                Err(sqlx::Error::Database(ref db_err))
                    if db_err.is_unique_violation()
                        && db_err.constraint() == Some(ORDER_NUMBER_CONSTRAINT) =>
                {
                    tracing::warn!(%order_number, "Order number collision, retrying");
                }
                Err(sqlx::Error::Database(ref db_err))
                    if db_err.constraint() == Some(CHECKOUT_SESSION_CONSTRAINT) =>
                {
                    return Err(RepositoryError::Conflict(
                        "checkout session already used".to_owned(),
                    ));
                }
                Err(e) => {
                    last_error = RepositoryError::from_write(e, "product is no longer available");
                    break;
                }
            }
        }

        Err(last_error)
    }

    /// Look up an order for customer tracking. The email must match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_customer(
        &self,
        order_number: &str,
        email: &Email,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1 AND customer_email = $2::CITEXT"
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_number)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        Ok(order)
    }

    /// Look up an order by its number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1");

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_number)
            .fetch_optional(self.pool)
            .await?;

        Ok(order)
    }

    /// Record the gateway order id on a freshly created prepaid order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_razorpay_order_id(
        &self,
        id: OrderId,
        razorpay_order_id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET razorpay_order_id = $2 WHERE id = $1")
            .bind(id)
            .bind(razorpay_order_id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "gateway order id already used"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a prepaid order that never got a gateway order id.
    ///
    /// Used when creating the Razorpay order fails, so the row cannot linger
    /// as an unpayable pending order and the checkout session can be retried.
    /// Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn discard_unpaid(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM orders
            WHERE id = $1 AND payment_status = 'pending' AND razorpay_order_id IS NULL
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark the order behind a gateway order id as paid and placed.
    ///
    /// Refunded orders are left alone. Returns `None` when no order carries
    /// the gateway id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_paid(
        &self,
        razorpay_order_id: &str,
        razorpay_payment_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE orders
            SET payment_status = 'paid',
                order_status = CASE WHEN order_status = 'pending' THEN 'placed'::order_status
                                    ELSE order_status END,
                razorpay_payment_id = $2
            WHERE razorpay_order_id = $1 AND payment_status <> 'refunded'
            RETURNING {ORDER_COLUMNS}
            "
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(razorpay_order_id)
            .bind(razorpay_payment_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(order)
    }

    /// Mark a still-pending payment as failed.
    ///
    /// A payment that was already captured stays paid. Returns `None` when
    /// nothing changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_failed(&self, razorpay_order_id: &str) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE orders
            SET payment_status = 'failed'
            WHERE razorpay_order_id = $1 AND payment_status = 'pending'
            RETURNING {ORDER_COLUMNS}
            "
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(razorpay_order_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(order)
    }

    /// Store a reward on an order that does not have one yet.
    ///
    /// Returns `None` if the order already carries a reward (or does not
    /// exist); the caller re-reads the stored reward in that case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_reward_once(
        &self,
        order_number: &str,
        reward: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE orders
            SET reward = $2
            WHERE order_number = $1 AND reward IS NULL
            RETURNING {ORDER_COLUMNS}
            "
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_number)
            .bind(reward)
            .fetch_optional(self.pool)
            .await?;

        Ok(order)
    }
}
