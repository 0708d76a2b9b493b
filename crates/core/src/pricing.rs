//! Checkout pricing.
//!
//! A quote is built in a fixed order:
//!
//! 1. `subtotal = unit_price × quantity`
//! 2. `gst = round2(subtotal × 18%)`
//! 3. `shipping = schedule.fee_for(subtotal + gst)`
//! 4. `base = subtotal + gst + shipping − discount` (discount clamped to `[0, subtotal + gst + shipping]`)
//! 5. `adjustment = ∓round2(base × 2%)`, negative for prepaid, positive for COD
//! 6. `total = base + adjustment`
//!
//! Everything here is pure: the storefront recomputes the quote from the
//! database on every checkout mutation and never trusts client numbers.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{PaymentMethod, round_paise, to_paise};

/// Goods and services tax applied to the subtotal (18%).
pub const GST_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// Prepaid discount / COD surcharge applied to the base amount (2%).
pub const PAYMENT_ADJUSTMENT_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Errors from building a quote.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("quantity {quantity} is outside the allowed range {min}-{max}")]
    QuantityOutOfRange { quantity: u32, min: u32, max: u32 },
    #[error("invalid quantity bounds {min}-{max}")]
    InvalidBounds { min: u32, max: u32 },
    #[error("unit price must be positive")]
    InvalidPrice,
    #[error("shipping schedule has no tiers")]
    EmptySchedule,
}

/// Inclusive quantity range a product can be ordered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuantityBounds {
    pub min: u32,
    pub max: u32,
}

impl QuantityBounds {
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidBounds`] if `min` is zero or above `max`.
    pub const fn new(min: u32, max: u32) -> Result<Self, PricingError> {
        if min == 0 || min > max {
            return Err(PricingError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// # Errors
    ///
    /// Returns [`PricingError::QuantityOutOfRange`] for zero or out-of-range quantities.
    pub const fn check(&self, quantity: u32) -> Result<(), PricingError> {
        if quantity == 0 || quantity < self.min || quantity > self.max {
            return Err(PricingError::QuantityOutOfRange {
                quantity,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// One step of the shipping schedule: orders at or above `threshold` pay `fee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShippingTier {
    pub threshold: Decimal,
    pub fee: Decimal,
}

/// Shipping fee tiers keyed on `subtotal + gst`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingSchedule {
    tiers: Vec<ShippingTier>,
}

impl ShippingSchedule {
    /// Build a schedule. Tiers are sorted by threshold.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::EmptySchedule`] when `tiers` is empty.
    pub fn new(mut tiers: Vec<ShippingTier>) -> Result<Self, PricingError> {
        if tiers.is_empty() {
            return Err(PricingError::EmptySchedule);
        }
        tiers.sort_by(|a, b| a.threshold.cmp(&b.threshold));
        Ok(Self { tiers })
    }

    /// Fee of the highest tier whose threshold is not above `amount`.
    ///
    /// Amounts below the first threshold pay the first tier's fee.
    #[must_use]
    pub fn fee_for(&self, amount: Decimal) -> Decimal {
        let mut fee = self.tiers.first().map_or(Decimal::ZERO, |t| t.fee);
        for tier in &self.tiers {
            if tier.threshold > amount {
                break;
            }
            fee = tier.fee;
        }
        fee
    }
}

impl Default for ShippingSchedule {
    /// ₹150 below ₹1,000, ₹75 below ₹5,000, free from ₹5,000.
    fn default() -> Self {
        Self {
            tiers: vec![
                ShippingTier {
                    threshold: Decimal::ZERO,
                    fee: Decimal::from(150),
                },
                ShippingTier {
                    threshold: Decimal::from(1000),
                    fee: Decimal::from(75),
                },
                ShippingTier {
                    threshold: Decimal::from(5000),
                    fee: Decimal::ZERO,
                },
            ],
        }
    }
}

/// What the caller knows about the line being bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteInput {
    pub unit_price: Decimal,
    pub quantity: u32,
    pub bounds: QuantityBounds,
    /// Coupon discount; clamped during quoting.
    pub discount: Decimal,
    pub payment_method: PaymentMethod,
}

/// A fully computed price for one payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
    pub gst: Decimal,
    pub shipping_fee: Decimal,
    pub discount: Decimal,
    pub base: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_adjustment: Decimal,
    pub total: Decimal,
}

/// Prepaid and COD quotes for the same line, shown side by side at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuoteOptions {
    pub prepaid: PriceQuote,
    pub cod: PriceQuote,
}

impl PriceQuote {
    /// Total in paise for the payment gateway.
    #[must_use]
    pub fn total_paise(&self) -> Option<i64> {
        to_paise(self.total)
    }

    /// Quote both payment methods, ignoring `input.payment_method`.
    ///
    /// # Errors
    ///
    /// See [`quote`].
    pub fn both(input: &QuoteInput, schedule: &ShippingSchedule) -> Result<QuoteOptions, PricingError> {
        Ok(QuoteOptions {
            prepaid: quote_with(
                &QuoteInput {
                    payment_method: PaymentMethod::Prepaid,
                    ..*input
                },
                schedule,
            )?,
            cod: quote_with(
                &QuoteInput {
                    payment_method: PaymentMethod::Cod,
                    ..*input
                },
                schedule,
            )?,
        })
    }
}

/// Quote using the default shipping schedule.
///
/// # Errors
///
/// Returns [`PricingError`] for a non-positive price or an out-of-range quantity.
pub fn quote(input: &QuoteInput) -> Result<PriceQuote, PricingError> {
    quote_with(input, &ShippingSchedule::default())
}

/// Quote against an explicit shipping schedule.
///
/// # Errors
///
/// Returns [`PricingError`] for a non-positive price or an out-of-range quantity.
pub fn quote_with(input: &QuoteInput, schedule: &ShippingSchedule) -> Result<PriceQuote, PricingError> {
    if input.unit_price <= Decimal::ZERO {
        return Err(PricingError::InvalidPrice);
    }
    input.bounds.check(input.quantity)?;

    let subtotal = round_paise(input.unit_price * Decimal::from(input.quantity));
    let gst = round_paise(subtotal * GST_RATE);
    let shipping_fee = schedule.fee_for(subtotal + gst);
    let gross = subtotal + gst + shipping_fee;

    let discount = round_paise(input.discount.clamp(Decimal::ZERO, gross));
    let base = gross - discount;

    let magnitude = round_paise(base * PAYMENT_ADJUSTMENT_RATE);
    let payment_adjustment = match input.payment_method {
        PaymentMethod::Prepaid => -magnitude,
        PaymentMethod::Cod => magnitude,
    };

    Ok(PriceQuote {
        unit_price: input.unit_price,
        quantity: input.quantity,
        subtotal,
        gst,
        shipping_fee,
        discount,
        base,
        payment_method: input.payment_method,
        payment_adjustment,
        total: base + payment_adjustment,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn input(unit_price: &str, quantity: u32, method: PaymentMethod) -> QuoteInput {
        QuoteInput {
            unit_price: d(unit_price),
            quantity,
            bounds: QuantityBounds::new(1, 10).unwrap(),
            discount: Decimal::ZERO,
            payment_method: method,
        }
    }

    #[test]
    fn test_prepaid_and_cod_quotes() {
        let options = PriceQuote::both(&input("499", 2, PaymentMethod::Prepaid), &ShippingSchedule::default()).unwrap();

        assert_eq!(options.prepaid.subtotal, d("998"));
        assert_eq!(options.prepaid.gst, d("179.64"));
        assert_eq!(options.prepaid.shipping_fee, d("75"));
        assert_eq!(options.prepaid.base, d("1252.64"));
        assert_eq!(options.prepaid.payment_adjustment, d("-25.05"));
        assert_eq!(options.prepaid.total, d("1227.59"));
        assert_eq!(options.prepaid.total_paise(), Some(122_759));

        assert_eq!(options.cod.payment_method, PaymentMethod::Cod);
        assert_eq!(options.cod.payment_adjustment, d("25.05"));
        assert_eq!(options.cod.total, d("1277.69"));
    }

    #[test]
    fn test_shipping_tier_boundaries() {
        let schedule = ShippingSchedule::default();
        assert_eq!(schedule.fee_for(d("0")), d("150"));
        assert_eq!(schedule.fee_for(d("999.99")), d("150"));
        assert_eq!(schedule.fee_for(d("1000")), d("75"));
        assert_eq!(schedule.fee_for(d("4999.99")), d("75"));
        assert_eq!(schedule.fee_for(d("5000")), d("0"));
        assert_eq!(schedule.fee_for(d("120000")), d("0"));
    }

    #[test]
    fn test_free_shipping_on_large_orders() {
        let q = quote(&input("4500", 1, PaymentMethod::Cod)).unwrap();
        assert_eq!(q.gst, d("810"));
        assert_eq!(q.shipping_fee, Decimal::ZERO);
        assert_eq!(q.total, d("5416.20"));
    }

    #[test]
    fn test_custom_schedule_is_sorted() {
        let schedule = ShippingSchedule::new(vec![
            ShippingTier {
                threshold: d("500"),
                fee: d("20"),
            },
            ShippingTier {
                threshold: d("0"),
                fee: d("40"),
            },
        ])
        .unwrap();
        assert_eq!(schedule.fee_for(d("499")), d("40"));
        assert_eq!(schedule.fee_for(d("500")), d("20"));
        assert_eq!(ShippingSchedule::new(Vec::new()), Err(PricingError::EmptySchedule));
    }

    #[test]
    fn test_discount_is_clamped() {
        let mut big = input("100", 1, PaymentMethod::Prepaid);
        big.discount = d("100000");
        let q = quote(&big).unwrap();
        assert_eq!(q.discount, d("268"));
        assert_eq!(q.base, Decimal::ZERO);
        assert_eq!(q.total, Decimal::ZERO);

        let mut negative = input("100", 1, PaymentMethod::Prepaid);
        negative.discount = d("-50");
        assert_eq!(quote(&negative).unwrap().discount, Decimal::ZERO);
    }

    #[test]
    fn test_discount_applies_before_adjustment() {
        let mut i = input("1000", 1, PaymentMethod::Cod);
        i.discount = d("180");
        let q = quote(&i).unwrap();
        assert_eq!(q.base, d("1075"));
        assert_eq!(q.payment_adjustment, d("21.50"));
        assert_eq!(q.total, d("1096.50"));
    }

    #[test]
    fn test_rounding_midpoint_away_from_zero() {
        let q = quote(&input("0.25", 1, PaymentMethod::Prepaid)).unwrap();
        assert_eq!(q.gst, d("0.05"));
    }

    #[test]
    fn test_quantity_bounds() {
        let bounds = QuantityBounds::new(2, 5).unwrap();
        assert!(bounds.check(2).is_ok());
        assert!(bounds.check(5).is_ok());
        assert_eq!(
            bounds.check(6),
            Err(PricingError::QuantityOutOfRange {
                quantity: 6,
                min: 2,
                max: 5
            })
        );
        assert!(bounds.check(1).is_err());
        assert!(bounds.check(0).is_err());

        assert!(QuantityBounds::new(0, 5).is_err());
        assert!(QuantityBounds::new(6, 5).is_err());

        let err = quote(&input("100", 11, PaymentMethod::Cod)).unwrap_err();
        assert!(matches!(err, PricingError::QuantityOutOfRange { quantity: 11, .. }));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        assert_eq!(quote(&input("0", 1, PaymentMethod::Cod)), Err(PricingError::InvalidPrice));
    }
}
