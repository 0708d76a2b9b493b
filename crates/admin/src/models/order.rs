//! Orders as staff manage them, plus list filtering and pagination.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use sonic_core::{
    Address, CategoryId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
};

/// Page size when the client does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Largest page a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// A stored order with every payment reference.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: Json<Address>,
    pub billing_address: Json<Address>,
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub gst: Decimal,
    pub shipping_fee: Decimal,
    pub discount: Decimal,
    pub coupon_code: Option<String>,
    pub payment_adjustment: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub reward: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order list filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// A 1-based page request, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    /// Build a page from raw query values. Zero or missing values fall
    /// back to the defaults and `per_page` is capped at [`MAX_PER_PAGE`].
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            per_page: per_page
                .filter(|p| *p > 0)
                .unwrap_or(DEFAULT_PER_PAGE)
                .min(MAX_PER_PAGE),
        }
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results with the total across all pages.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn new(items: Vec<T>, page: Page, total: i64) -> Self {
        let per_page = i64::from(page.per_page.max(1));
        Self {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
            total_pages: (total + per_page - 1) / per_page,
        }
    }
}

/// Body of `PUT /api/orders/{id}/status`. At least one field must be set.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub order_status: Option<OrderStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

impl StatusUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.order_status.is_none() && self.payment_status.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_clamping() {
        assert_eq!(Page::new(None, None), Page { page: 1, per_page: 20 });
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, per_page: 20 });
        assert_eq!(Page::new(Some(3), Some(500)).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_page_offset() {
        let page = Page::new(Some(3), Some(25));
        assert_eq!(page.limit(), 25);
        assert_eq!(page.offset(), 50);
        assert_eq!(Page::default().offset(), 0);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = Page::new(Some(1), Some(20));
        assert_eq!(Paginated::<u8>::new(vec![], page, 0).total_pages, 0);
        assert_eq!(Paginated::<u8>::new(vec![], page, 20).total_pages, 1);
        assert_eq!(Paginated::<u8>::new(vec![], page, 21).total_pages, 2);
    }

    #[test]
    fn test_status_update_parsing() {
        let update: StatusUpdate =
            serde_json::from_value(serde_json::json!({ "order_status": "shipped" })).unwrap();
        assert_eq!(update.order_status, Some(OrderStatus::Shipped));
        assert!(update.payment_status.is_none());

        let empty: StatusUpdate = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.is_empty());

        assert!(
            serde_json::from_value::<StatusUpdate>(serde_json::json!({ "order_status": "lost" }))
                .is_err()
        );
    }
}
