//! Order route handlers.
//!
//! Cash-on-delivery orders are created here. Prepaid orders go through
//! `routes::payment`. Both share the customer details form below.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use sonic_core::pricing::PriceQuote;
use sonic_core::{Address, Email, OrderStatus, PaymentMethod, PaymentStatus, Phone};

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::CheckoutSession;
use crate::models::{Customer, NewOrder, Order};
use crate::services::checkout::PricedOrder;
use crate::services::{Checkout, CheckoutClaims};
use crate::state::AppState;

/// Customer details posted with an order.
#[derive(Debug, Deserialize)]
pub struct CustomerForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: Address,
    /// Defaults to the shipping address.
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

impl CustomerForm {
    /// Validate and normalise the form.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` naming the first invalid field.
    pub fn into_customer(self) -> Result<(Customer, Option<String>)> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".to_string()));
        }

        let email = Email::parse(&self.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let phone = Phone::parse(&self.phone).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let shipping_address = self
            .shipping_address
            .normalised()
            .map_err(|e| AppError::BadRequest(format!("shipping address: {e}")))?;
        let billing_address = match self.billing_address {
            Some(address) => address
                .normalised()
                .map_err(|e| AppError::BadRequest(format!("billing address: {e}")))?,
            None => shipping_address.clone(),
        };

        let customer = Customer {
            name,
            email,
            phone,
            shipping_address,
            billing_address,
        };
        Ok((customer, self.coupon_code))
    }
}

/// Price and insert an order for the product and quantity in the session.
///
/// A session places at most one order; a second attempt is a conflict.
pub(crate) async fn place_order(
    state: &AppState,
    claims: &CheckoutClaims,
    form: CustomerForm,
    payment_method: PaymentMethod,
    order_status: OrderStatus,
) -> Result<(Order, PriceQuote)> {
    let (customer, coupon_code) = form.into_customer()?;

    let PricedOrder {
        product,
        quote,
        coupon_code,
    } = Checkout::new(state.pool(), state.shipping())
        .price_order(
            claims.product_id,
            claims.quantity,
            coupon_code.as_deref(),
            payment_method,
            Utc::now(),
        )
        .await?;

    let order = OrderRepository::new(state.pool())
        .create(&NewOrder {
            customer,
            product_id: product.id,
            category_id: product.category_id,
            product_name: product.name,
            coupon_code,
            quote,
            order_status,
            payment_status: PaymentStatus::Pending,
            checkout_session_id: claims.jti,
        })
        .await?;

    add_breadcrumb(
        "checkout",
        "Order created",
        Some(&[
            ("order_number", order.order_number.as_str()),
            ("payment_method", payment_method.as_str()),
        ]),
    );

    Ok((order, quote))
}

/// `POST /api/orders` (cash on delivery)
#[instrument(skip_all, fields(product_id = %claims.product_id, quantity = claims.quantity))]
pub async fn create_cod(
    State(state): State<AppState>,
    CheckoutSession(claims): CheckoutSession,
    Json(form): Json<CustomerForm>,
) -> Result<(StatusCode, Json<Order>)> {
    let (order, _) =
        place_order(&state, &claims, form, PaymentMethod::Cod, OrderStatus::Placed).await?;

    tracing::info!(
        order_number = %order.order_number,
        total = %order.total,
        "COD order placed"
    );

    Ok((StatusCode::CREATED, Json(order)))
}

/// Query parameters for order tracking.
#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub email: String,
}

/// `GET /api/orders/{order_number}?email=`
///
/// A wrong email and an unknown order number are indistinguishable.
#[instrument(skip(state, query))]
pub async fn show(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<Order>> {
    let not_found = || AppError::NotFound("Order not found".to_string());

    let email = Email::parse(&query.email).map_err(|_| not_found())?;
    let order_number = order_number.trim().to_ascii_uppercase();

    OrderRepository::new(state.pool())
        .get_for_customer(&order_number, &email)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(json: serde_json::Value) -> CustomerForm {
        serde_json::from_value(json).unwrap()
    }

    fn valid() -> serde_json::Value {
        serde_json::json!({
            "name": "  Asha Rao ",
            "email": "Asha@Example.in",
            "phone": "+91 98450 12345",
            "shipping_address": {
                "line1": "14 MG Road",
                "city": "Bengaluru",
                "state": "Karnataka",
                "pincode": "560001"
            }
        })
    }

    #[test]
    fn test_billing_defaults_to_shipping() {
        let (customer, coupon) = form(valid()).into_customer().unwrap();
        assert_eq!(customer.name, "Asha Rao");
        assert_eq!(customer.billing_address, customer.shipping_address);
        assert_eq!(customer.shipping_address.country, "India");
        assert!(coupon.is_none());
    }

    #[test]
    fn test_rejects_blank_name() {
        let mut json = valid();
        json["name"] = serde_json::json!("   ");
        assert!(matches!(form(json).into_customer(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_rejects_bad_email() {
        let mut json = valid();
        json["email"] = serde_json::json!("asha.example.in");
        assert!(matches!(form(json).into_customer(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_rejects_bad_pincode() {
        let mut json = valid();
        json["shipping_address"]["pincode"] = serde_json::json!("5600");
        let err = form(json).into_customer().unwrap_err();
        assert!(err.to_string().contains("shipping address"));
    }
}
