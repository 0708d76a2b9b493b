//! Rupee amounts using decimal arithmetic.
//!
//! All prices in the store are Indian rupees. Amounts are kept as
//! [`Decimal`] with two fractional digits; the payment gateway wants an
//! integer count of paise.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;

/// ISO 4217 code for every amount in the store.
pub const CURRENCY: &str = "INR";

/// Round to paise using commercial rounding (half away from zero).
#[must_use]
pub fn round_paise(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a rupee amount to integer paise.
///
/// Returns `None` for negative amounts or values that do not fit in `i64`.
#[must_use]
pub fn to_paise(amount: Decimal) -> Option<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }
    (round_paise(amount) * Decimal::ONE_HUNDRED).to_i64()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap_or_default()
    }

    #[test]
    fn test_round_paise_half_away_from_zero() {
        assert_eq!(round_paise(d("10.005")), d("10.01"));
        assert_eq!(round_paise(d("10.004")), d("10.00"));
        assert_eq!(round_paise(d("-10.005")), d("-10.01"));
    }

    #[test]
    fn test_paise_conversions() {
        assert_eq!(to_paise(d("1499.50")), Some(149_950));
        assert_eq!(to_paise(Decimal::ZERO), Some(0));
        assert_eq!(to_paise(d("-1")), None);
    }
}
