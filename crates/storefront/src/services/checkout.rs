//! Server-side checkout pricing.
//!
//! Every number the customer pays is recomputed here from the database:
//! the product price and bounds, the coupon's deal, and the pricing rules
//! in `sonic_core::pricing`. Nothing priced by the client is trusted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use sonic_core::coupon::{self, CouponOutcome, CouponRejection, DealTerms};
use sonic_core::pricing::{self, PriceQuote, PricingError, QuoteInput, QuoteOptions, ShippingSchedule};
use sonic_core::{PaymentMethod, ProductId};

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::Product;

/// Errors from pricing a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The product is gone or inactive.
    #[error("product {0} is not available")]
    ProductUnavailable(ProductId),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A coupon was supplied for an order and does not apply.
    #[error("coupon is not valid: {0:?}")]
    InvalidCoupon(CouponRejection),
}

/// A coupon that passed evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedCoupon {
    pub code: String,
    #[serde(flatten)]
    pub outcome: CouponOutcome,
}

/// Both quotes for the checkout page.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSummary {
    pub product: Product,
    pub quantity: u32,
    pub quotes: QuoteOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<AppliedCoupon>,
}

/// The quote an order is stored with.
#[derive(Debug, Clone)]
pub struct PricedOrder {
    pub product: Product,
    pub quote: PriceQuote,
    pub coupon_code: Option<String>,
}

/// Checkout pricing backed by the catalog.
pub struct Checkout<'a> {
    pool: &'a PgPool,
    schedule: &'a ShippingSchedule,
}

impl<'a> Checkout<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, schedule: &'a ShippingSchedule) -> Self {
        Self { pool, schedule }
    }

    /// Load an orderable product and check the quantity against its bounds.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::ProductUnavailable` for missing/inactive
    /// products and `CheckoutError::Pricing` for a bad quantity.
    pub async fn product_for(&self, product_id: ProductId, quantity: u32) -> Result<Product, CheckoutError> {
        let product = CatalogRepository::new(self.pool)
            .get_product(product_id)
            .await?
            .ok_or(CheckoutError::ProductUnavailable(product_id))?;

        product.bounds()?.check(quantity)?;
        Ok(product)
    }

    /// Evaluate a coupon code for a product and quantity.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if the deal lookup fails.
    pub async fn evaluate_coupon(
        &self,
        code: &str,
        product: &Product,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<AppliedCoupon, CheckoutError> {
        let code = coupon::normalize_code(code);
        let deal = if code.is_empty() {
            None
        } else {
            CatalogRepository::new(self.pool).find_deal_by_code(&code).await?
        };
        let terms = deal.as_ref().map(DealTerms::from);

        let outcome = coupon::evaluate(terms.as_ref(), product.id, product.price, quantity, now);
        Ok(AppliedCoupon { code, outcome })
    }

    /// Price both payment methods for the checkout page.
    ///
    /// An invalid coupon is reported in the summary rather than failing.
    ///
    /// # Errors
    ///
    /// See [`Checkout::product_for`].
    pub async fn summary(
        &self,
        product_id: ProductId,
        quantity: u32,
        coupon_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CheckoutSummary, CheckoutError> {
        let product = self.product_for(product_id, quantity).await?;

        let coupon = match coupon_code.filter(|c| !c.trim().is_empty()) {
            Some(code) => Some(self.evaluate_coupon(code, &product, quantity, now).await?),
            None => None,
        };
        let discount = coupon.as_ref().map_or(rust_decimal::Decimal::ZERO, |c| c.outcome.discount);

        let input = QuoteInput {
            unit_price: product.price,
            quantity,
            bounds: product.bounds()?,
            discount,
            payment_method: PaymentMethod::Prepaid,
        };
        let quotes = PriceQuote::both(&input, self.schedule)?;

        Ok(CheckoutSummary {
            product,
            quantity,
            quotes,
            coupon,
        })
    }

    /// Price an order for one payment method.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidCoupon` if a supplied coupon does not
    /// apply, plus the errors of [`Checkout::product_for`].
    pub async fn price_order(
        &self,
        product_id: ProductId,
        quantity: u32,
        coupon_code: Option<&str>,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<PricedOrder, CheckoutError> {
        let product = self.product_for(product_id, quantity).await?;

        let (discount, coupon_code) = match coupon_code.filter(|c| !c.trim().is_empty()) {
            Some(code) => {
                let applied = self.evaluate_coupon(code, &product, quantity, now).await?;
                if let Some(reason) = applied.outcome.reason {
                    return Err(CheckoutError::InvalidCoupon(reason));
                }
                (applied.outcome.discount, Some(applied.code))
            }
            None => (rust_decimal::Decimal::ZERO, None),
        };

        let quote = pricing::quote_with(
            &QuoteInput {
                unit_price: product.price,
                quantity,
                bounds: product.bounds()?,
                discount,
                payment_method,
            },
            self.schedule,
        )?;

        Ok(PricedOrder {
            product,
            quote,
            coupon_code,
        })
    }
}
