//! Status and role enums shared by the storefront, admin and CLI.
//!
//! Each enum maps to a PostgreSQL enum type of the same name (see
//! `migrations/`), serializes as `snake_case`, and round-trips through
//! `Display`/`FromStr` for query-string filters.

use serde::{Deserialize, Serialize};

/// Implements `Display`, `FromStr` and `ALL` for a unit-only enum from a
/// list of `Variant => "wire_name"` pairs.
macro_rules! wire_names {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire/database name of this variant.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($ty), ": {}"), s)),
                }
            }
        }
    };
}

/// Fulfilment lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Prepaid order created, waiting for the gateway.
    #[default]
    Pending,
    /// Payment captured (prepaid) or COD order accepted.
    Placed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

wire_names!(OrderStatus {
    Pending => "pending",
    Placed => "placed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

/// Money movement for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

wire_names!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

/// How the customer pays.
///
/// The method changes the final price: prepaid orders get a discount and
/// cash-on-delivery orders carry a surcharge (see [`crate::pricing`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Prepaid,
    Cod,
}

wire_names!(PaymentMethod {
    Prepaid => "prepaid",
    Cod => "cod",
});

/// Follow-up state of a contact-form lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "lead_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Converted,
    Closed,
}

wire_names!(LeadStatus {
    New => "new",
    Contacted => "contacted",
    Qualified => "qualified",
    Converted => "converted",
    Closed => "closed",
});

impl LeadStatus {
    /// Whether staff still need to act on the lead.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::New | Self::Contacted | Self::Qualified)
    }
}

/// Staff role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Read-only access to dashboards and records.
    Viewer,
    /// Can manage catalog, orders, leads and deals.
    Editor,
    /// Full access including staff management.
    Admin,
}

wire_names!(UserRole {
    Viewer => "viewer",
    Editor => "editor",
    Admin => "admin",
});

impl UserRole {
    /// Whether this role grants at least the permissions of `required`.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self >= required
    }
}
