//! Postal addresses stored on orders.

use serde::{Deserialize, Serialize};

/// Errors from [`Address::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("pincode must be 6 digits")]
    InvalidPincode,
}

/// A shipping or billing address.
///
/// Stored as `JSONB` on the order row so the record keeps the address the
/// customer typed even if they later use a different one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "India".to_owned()
}

impl Address {
    /// Trim every field and check the required ones.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] for the first missing field or a malformed pincode.
    pub fn normalised(mut self) -> Result<Self, AddressError> {
        self.line1 = self.line1.trim().to_owned();
        self.city = self.city.trim().to_owned();
        self.state = self.state.trim().to_owned();
        self.pincode = self.pincode.trim().to_owned();
        self.country = self.country.trim().to_owned();
        self.line2 = trim_optional(self.line2);
        self.landmark = trim_optional(self.landmark);

        self.validate()?;
        Ok(self)
    }

    /// Check required fields without modifying them.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] for the first missing field or a malformed pincode.
    pub fn validate(&self) -> Result<(), AddressError> {
        for (value, field) in [
            (&self.line1, "line1"),
            (&self.city, "city"),
            (&self.state, "state"),
            (&self.country, "country"),
        ] {
            if value.trim().is_empty() {
                return Err(AddressError::Missing(field));
            }
        }

        if self.pincode.len() != 6 || !self.pincode.chars().all(|c| c.is_ascii_digit()) {
            return Err(AddressError::InvalidPincode);
        }

        Ok(())
    }
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
