//! Aggregates for the dashboard.

use rust_decimal::Decimal;
use sqlx::PgPool;

use sonic_core::LeadStatus;

use super::RepositoryError;
use crate::models::{DashboardSummary, EntityCounts, OrderSummary, StatusCount};

/// Rows in the recent orders table.
const RECENT_ORDERS: i64 = 10;

/// Database names of the lead statuses counted as open.
fn open_lead_statuses() -> Vec<&'static str> {
    LeadStatus::ALL
        .iter()
        .filter(|s| s.is_open())
        .map(LeadStatus::as_str)
        .collect()
}

/// Repository for dashboard aggregates.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Build the dashboard summary.
    ///
    /// The queries run one after another on the pool, so the numbers can
    /// be a moment apart on a busy shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn summary(&self) -> Result<DashboardSummary, RepositoryError> {
        let counts = sqlx::query_as::<_, EntityCounts>(
            r"
            SELECT
                (SELECT COUNT(*) FROM products) AS products,
                (SELECT COUNT(*) FROM categories) AS categories,
                (SELECT COUNT(*) FROM leads
                  WHERE status::TEXT = ANY($1)) AS open_leads,
                (SELECT COUNT(*) FROM orders) AS orders
            ",
        )
        .bind(open_lead_statuses())
        .fetch_one(self.pool)
        .await?;

        let orders_by_status = sqlx::query_as::<_, StatusCount>(
            r"
            SELECT order_status AS status, COUNT(*) AS count
            FROM orders
            GROUP BY order_status
            ORDER BY order_status
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let (paid_revenue, cod_outstanding): (Decimal, Decimal) = sqlx::query_as(
            r"
            SELECT
                COALESCE(SUM(total) FILTER (WHERE payment_status = 'paid'), 0),
                COALESCE(SUM(total) FILTER (
                    WHERE payment_method = 'cod'
                      AND payment_status = 'pending'
                      AND order_status <> 'cancelled'
                ), 0)
            FROM orders
            ",
        )
        .fetch_one(self.pool)
        .await?;

        let recent_orders = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT id, order_number, customer_name, product_name, total,
                   payment_method, order_status, payment_status, created_at
            FROM orders
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(RECENT_ORDERS)
        .fetch_all(self.pool)
        .await?;

        Ok(DashboardSummary {
            counts,
            orders_by_status,
            paid_revenue,
            cod_outstanding,
            recent_orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_lead_statuses() {
        assert_eq!(open_lead_statuses(), vec!["new", "contacted", "qualified"]);
    }
}
