//! Domain models for the admin API.
//!
//! Row types derive `sqlx::FromRow` and serialize straight to JSON. Input
//! types are what handlers hand to repositories after validation.

pub mod catalog;
pub mod dashboard;
pub mod deal;
pub mod lead;
pub mod order;
pub mod user;

pub use catalog::{Category, CategoryInput, Product, ProductFilter, ProductInput};
pub use dashboard::{DashboardSummary, EntityCounts, OrderSummary, StatusCount};
pub use deal::{Deal, DealInput};
pub use lead::Lead;
pub use order::{Order, OrderFilter, Page, Paginated, StatusUpdate};
pub use user::{NewUser, User};
