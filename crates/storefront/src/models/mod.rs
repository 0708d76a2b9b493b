//! Domain models for the storefront.

pub mod catalog;
pub mod lead;
pub mod order;

pub use catalog::{Category, CategoryWithProducts, DealRow, Product, PublicDeal, SitemapRow};
pub use lead::NewLead;
pub use order::{Customer, NewOrder, Order, generate_order_number};
