//! Field checks shared by the catalog and deal forms.

use rust_decimal::Decimal;

use sonic_core::{is_valid_slug, round_paise, slugify};

use crate::error::{AppError, Result};

/// Largest amount a `NUMERIC(12, 2)` column holds, exclusive.
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Trim a required text field.
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_owned())
}

/// Trim an optional text field. Blank counts as absent.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// The slug to store: the given one if present, else one derived from `name`.
pub(crate) fn slug_for(name: &str, slug: Option<String>) -> Result<String> {
    let slug = optional(slug).unwrap_or_else(|| slugify(name));
    if !is_valid_slug(&slug) {
        return Err(AppError::BadRequest(
            "slug must be lowercase letters, digits and single dashes".to_owned(),
        ));
    }
    Ok(slug)
}

/// An absolute http(s) URL.
pub(crate) fn image_url(value: &str) -> Result<String> {
    let value = value.trim();
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value.to_owned()),
        _ => Err(AppError::BadRequest(format!("invalid image URL: {value}"))),
    }
}

/// A money amount rounded to paise. `allow_zero` permits a free price.
pub(crate) fn amount(field: &str, value: Decimal, allow_zero: bool) -> Result<Decimal> {
    let value = round_paise(value);
    let in_range = if allow_zero {
        value >= Decimal::ZERO
    } else {
        value > Decimal::ZERO
    };

    if !in_range || value >= MAX_AMOUNT {
        let bound = if allow_zero { "zero or more" } else { "greater than zero" };
        return Err(AppError::BadRequest(format!("{field} must be {bound}")));
    }
    Ok(value)
}
