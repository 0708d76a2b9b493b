//! Promotional deals and their coupon codes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use sonic_core::coupon::DealTerms;
use sonic_core::{DealId, ProductId};

/// A deal with the name of the product it targets, if any.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Deal {
    pub id: DealId,
    pub title: String,
    pub description: Option<String>,
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
    pub coupon_code: String,
    pub deal_price: Decimal,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// Whether the coupon would be accepted at `now`.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        DealTerms {
            product_id: self.product_id,
            deal_price: self.deal_price,
            is_active: self.is_active,
            starts_at: self.starts_at,
            expires_at: self.expires_at,
        }
        .is_live_at(now)
    }
}

/// Validated deal fields for insert and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealInput {
    pub title: String,
    pub description: Option<String>,
    pub product_id: Option<ProductId>,
    /// Already normalised (trimmed, upper-case).
    pub coupon_code: String,
    pub deal_price: Decimal,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}
