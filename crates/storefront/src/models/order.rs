//! Orders placed through checkout.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::types::Json;
use uuid::Uuid;

use sonic_core::pricing::PriceQuote;
use sonic_core::{
    Address, CategoryId, Email, OrderId, OrderStatus, PaymentMethod, PaymentStatus, Phone,
    ProductId,
};

/// Prefix of every order number.
pub const ORDER_NUMBER_PREFIX: &str = "SI-";

/// Characters used in order numbers. `0`, `O`, `1` and `I` are left out so
/// numbers read back over the phone are unambiguous.
const ORDER_NUMBER_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const ORDER_NUMBER_LEN: usize = 8;

/// Generate a fresh order number such as `SI-7KQ2M9XD`.
#[must_use]
pub fn generate_order_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut number = String::with_capacity(ORDER_NUMBER_PREFIX.len() + ORDER_NUMBER_LEN);
    number.push_str(ORDER_NUMBER_PREFIX);
    for _ in 0..ORDER_NUMBER_LEN {
        let idx = rng.random_range(0..ORDER_NUMBER_ALPHABET.len());
        if let Some(&ch) = ORDER_NUMBER_ALPHABET.get(idx) {
            number.push(char::from(ch));
        }
    }
    number
}

/// A stored order.
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
    #[serde(skip_serializing)]
    pub razorpay_payment_id: Option<String>,
    pub reward: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether the order has gone through and earns a reward spin.
    ///
    /// Prepaid orders need a captured payment. COD orders count once placed
    /// and for as long as they move forward (processing, shipped, delivered).
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        match self.payment_method {
            PaymentMethod::Prepaid => {
                matches!(self.payment_status, PaymentStatus::Paid)
                    && !matches!(self.order_status, OrderStatus::Cancelled)
            }
            PaymentMethod::Cod => matches!(
                self.order_status,
                OrderStatus::Placed
                    | OrderStatus::Processing
                    | OrderStatus::Shipped
                    | OrderStatus::Delivered
            ),
        }
    }
}

/// Customer details collected at checkout.
#[derive(Debug, Clone)]
pub struct Customer {
    pub name: String,
    pub email: Email,
    pub phone: Phone,
    pub shipping_address: Address,
    pub billing_address: Address,
}

/// Everything needed to insert an order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: Customer,
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub product_name: String,
    pub coupon_code: Option<String>,
    pub quote: PriceQuote,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// `jti` of the checkout session that placed the order. One order per session.
    pub checkout_session_id: Uuid,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_order_number_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let number = generate_order_number(&mut rng);
            assert_eq!(number.len(), 11);
            let suffix = number.strip_prefix(ORDER_NUMBER_PREFIX).unwrap();
            assert!(suffix.bytes().all(|b| ORDER_NUMBER_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_order_numbers_differ() {
        let mut rng = StdRng::seed_from_u64(2);
        let a = generate_order_number(&mut rng);
        let b = generate_order_number(&mut rng);
        assert_ne!(a, b);
    }

    pub(crate) fn sample_order(method: PaymentMethod) -> Order {
        let address = Address {
            line1: "Plot 14, MIDC Bhosari".to_owned(),
            line2: None,
            landmark: None,
            city: "Pune".to_owned(),
            state: "Maharashtra".to_owned(),
            pincode: "411026".to_owned(),
            country: "India".to_owned(),
        };
        Order {
            id: OrderId::new(1),
            order_number: "SI-7KQ2M9XD".to_owned(),
            customer_name: "Asha Rao".to_owned(),
            customer_email: "asha@example.in".to_owned(),
            customer_phone: "9876543210".to_owned(),
            shipping_address: Json(address.clone()),
            billing_address: Json(address),
            product_id: ProductId::new(3),
            category_id: CategoryId::new(1),
            product_name: "Sonic Wet & Dry 30L".to_owned(),
            quantity: 1,
            unit_price: Decimal::from(4500),
            subtotal: Decimal::from(4500),
            gst: Decimal::from(810),
            shipping_fee: Decimal::ZERO,
            discount: Decimal::ZERO,
            coupon_code: None,
            payment_adjustment: Decimal::new(-10620, 2),
            total: Decimal::new(520_380, 2),
            payment_method: method,
            order_status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            razorpay_order_id: None,
            razorpay_payment_id: None,
            reward: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_prepaid_completion_needs_payment() {
        let mut order = sample_order(PaymentMethod::Prepaid);
        assert!(!order.is_completed());

        order.order_status = OrderStatus::Placed;
        order.payment_status = PaymentStatus::Paid;
        assert!(order.is_completed());

        order.order_status = OrderStatus::Cancelled;
        assert!(!order.is_completed());
    }

    #[test]
    fn test_cod_completion_follows_order_status() {
        let mut order = sample_order(PaymentMethod::Cod);
        assert!(!order.is_completed());

        order.order_status = OrderStatus::Placed;
        assert!(order.is_completed());

        order.order_status = OrderStatus::Delivered;
        assert!(order.is_completed());

        order.order_status = OrderStatus::Cancelled;
        assert!(!order.is_completed());
    }

    #[test]
    fn test_serialization_hides_payment_id() {
        let mut order = sample_order(PaymentMethod::Prepaid);
        order.razorpay_payment_id = Some("pay_29QQoUBi66xm2f".to_owned());
        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("razorpay_payment_id").is_none());
        assert_eq!(json["shipping_address"]["city"], "Pune");
        assert_eq!(json["payment_method"], "prepaid");
    }
}
