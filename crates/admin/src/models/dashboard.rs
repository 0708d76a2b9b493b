//! Dashboard summary data.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use sonic_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus};

/// Everything the dashboard page renders.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub counts: EntityCounts,
    pub orders_by_status: Vec<StatusCount>,
    /// Sum of totals over paid orders.
    pub paid_revenue: Decimal,
    /// Sum of totals over live COD orders not yet paid.
    pub cod_outstanding: Decimal,
    pub recent_orders: Vec<OrderSummary>,
}

#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
pub struct EntityCounts {
    pub products: i64,
    pub categories: i64,
    pub open_leads: i64,
    pub orders: i64,
}

#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// One row of the recent orders table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub customer_name: String,
    pub product_name: String,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}
