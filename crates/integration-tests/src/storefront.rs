//! The storefront running inside the test process against a stub Razorpay API.
//!
//! Payment tests sign gateway callbacks with known secrets and make order
//! creation fail on demand, which a server started by hand cannot offer.
//! Only `DATABASE_URL` (migrated) is needed.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use reqwest::{Client, RequestBuilder};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::PgPool;
use tokio::net::TcpListener;

use sonic_storefront::config::{RazorpayConfig, StorefrontConfig};
use sonic_storefront::services::razorpay::sign_hmac_sha256;
use sonic_storefront::state::AppState;

use crate::{TestSetupError, database_url, expect_json, random_client_ip, unique_suffix};

pub const RAZORPAY_KEY_ID: &str = "rzp_test_integration";
pub const RAZORPAY_KEY_SECRET: &str = "it-Kx7pQ2vL9mR4zW8nB3cJ";
pub const RAZORPAY_WEBHOOK_SECRET: &str = "it-wh3Nf8Tq1Zr6Vb0Yd5gH";
const JWT_SECRET: &str = "k9$Qv2!xLm7@Rt4#Zp8&Wn3^Hs6*Jd1%";

/// How the stub answers `POST /v1/orders`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gateway {
    Accepting,
    Failing,
}

/// Response of `POST /api/payment/create-order`.
#[derive(Debug, Deserialize)]
pub struct PaymentOrder {
    pub order_number: String,
    pub razorpay_order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

/// Status columns of a stored order.
#[derive(Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderState {
    pub order_status: String,
    pub payment_status: String,
}

/// A storefront served on an ephemeral port, plus a pool on its database.
pub struct StubbedStorefront {
    pub client: Client,
    pub base_url: String,
    pub pool: PgPool,
    client_ip: String,
}

impl StubbedStorefront {
    /// Start a stub gateway and a storefront pointed at it.
    ///
    /// `webhooks` controls whether a webhook secret is configured.
    ///
    /// # Errors
    ///
    /// Returns `TestSetupError` if the database is unreachable or a listener
    /// cannot be bound.
    pub async fn start(gateway: Gateway, webhooks: bool) -> Result<Self, TestSetupError> {
        dotenvy::dotenv().ok();
        let database_url = database_url()?;
        let pool = sonic_storefront::db::create_pool(&database_url).await?;

        let gateway_url = spawn(stub_gateway(gateway)).await?;

        let config = StorefrontConfig {
            database_url,
            host: Ipv4Addr::LOCALHOST.into(),
            port: 0,
            site_url: "https://shop.sonic.test".to_string(),
            frontend_url: "https://shop.sonic.test".to_string(),
            jwt_secret: SecretString::from(JWT_SECRET),
            checkout_session_ttl: Duration::from_secs(900),
            razorpay: RazorpayConfig {
                key_id: RAZORPAY_KEY_ID.to_string(),
                key_secret: SecretString::from(RAZORPAY_KEY_SECRET),
                webhook_secret: webhooks.then(|| SecretString::from(RAZORPAY_WEBHOOK_SECRET)),
                api_base: gateway_url,
            },
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };

        let state = AppState::new(config, pool.clone())?;
        let base_url = spawn(sonic_storefront::app(state)).await?;

        Ok(Self {
            client: Client::new(),
            base_url,
            pool,
            client_ip: random_client_ip(),
        })
    }

    /// A POST from this harness's client address.
    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{path}", self.base_url))
            .header("x-forwarded-for", &self.client_ip)
    }

    /// Insert a category and an active product priced at `price`.
    ///
    /// # Errors
    ///
    /// Returns `TestSetupError::Database` if the insert fails.
    pub async fn insert_product(&self, price: &str) -> Result<i32, TestSetupError> {
        let suffix = unique_suffix();

        let id = sqlx::query_scalar(
            r"
            WITH category AS (
                INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id
            )
            INSERT INTO products (category_id, name, slug, price, min_quantity, max_quantity)
            SELECT id, $3, $4, $5::TEXT::NUMERIC, 1, 5 FROM category
            RETURNING id
            ",
        )
        .bind(format!("Payment Pumps {suffix}"))
        .bind(format!("payment-pumps-{suffix}"))
        .bind(format!("Payment Pump {suffix}"))
        .bind(format!("payment-pump-{suffix}"))
        .bind(price)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Start a checkout session and return its token.
    ///
    /// # Errors
    ///
    /// Returns `TestSetupError::Unexpected` unless the session is created.
    pub async fn start_session(&self, product_id: i32, quantity: u32) -> Result<String, TestSetupError> {
        let body = expect_json(
            self.post("/api/checkout/session")
                .json(&json!({ "product_id": product_id, "quantity": quantity }))
                .send()
                .await?,
            StatusCode::CREATED,
        )
        .await?;

        body["token"]
            .as_str()
            .map(ToOwned::to_owned)
            .ok_or_else(|| TestSetupError::Unexpected {
                status: StatusCode::CREATED,
                body: body.to_string(),
            })
    }

    /// Start a prepaid order through the stub gateway.
    ///
    /// # Errors
    ///
    /// Returns `TestSetupError::Unexpected` unless the gateway order is created.
    pub async fn create_payment(&self, token: &str, email: &str) -> Result<PaymentOrder, TestSetupError> {
        let body = expect_json(
            self.post("/api/payment/create-order")
                .bearer_auth(token)
                .json(&customer(email))
                .send()
                .await?,
            StatusCode::OK,
        )
        .await?;

        serde_json::from_value(body.clone()).map_err(|_| TestSetupError::Unexpected {
            status: StatusCode::OK,
            body: body.to_string(),
        })
    }

    /// Deliver a webhook signed with the configured secret.
    ///
    /// # Errors
    ///
    /// Returns `TestSetupError::Http` if the request cannot be sent.
    pub async fn send_webhook(
        &self,
        event: &str,
        razorpay_order_id: &str,
        razorpay_payment_id: &str,
    ) -> Result<reqwest::Response, TestSetupError> {
        let body = serde_json::to_vec(&json!({
            "entity": "event",
            "event": event,
            "payload": {
                "payment": {
                    "entity": {
                        "id": razorpay_payment_id,
                        "order_id": razorpay_order_id,
                        "currency": "INR"
                    }
                }
            }
        }))
        .unwrap_or_default();
        let signature = sign_hmac_sha256(RAZORPAY_WEBHOOK_SECRET, &body);

        Ok(self
            .post("/api/payment/webhook")
            .header("content-type", "application/json")
            .header("x-razorpay-signature", signature)
            .body(body)
            .send()
            .await?)
    }

    /// Status columns of an order, if it exists.
    ///
    /// # Errors
    ///
    /// Returns `TestSetupError::Database` if the query fails.
    pub async fn order_state(&self, order_number: &str) -> Result<Option<OrderState>, TestSetupError> {
        let state = sqlx::query_as::<_, OrderState>(
            r"
            SELECT order_status::TEXT AS order_status, payment_status::TEXT AS payment_status
            FROM orders WHERE order_number = $1
            ",
        )
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    /// Orders stored for a customer email.
    ///
    /// # Errors
    ///
    /// Returns `TestSetupError::Database` if the query fails.
    pub async fn count_orders_for(&self, email: &str) -> Result<i64, TestSetupError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_email = $1::CITEXT")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// The signature the checkout widget would return for a payment.
#[must_use]
pub fn payment_signature(razorpay_order_id: &str, razorpay_payment_id: &str) -> String {
    sign_hmac_sha256(
        RAZORPAY_KEY_SECRET,
        format!("{razorpay_order_id}|{razorpay_payment_id}").as_bytes(),
    )
}

/// A valid customer form for `email`.
#[must_use]
pub fn customer(email: &str) -> Value {
    json!({
        "name": "Meena Iyer",
        "email": email,
        "phone": "+91 94430 11223",
        "shipping_address": {
            "line1": "7 Avinashi Road",
            "city": "Coimbatore",
            "state": "Tamil Nadu",
            "pincode": "641018"
        }
    })
}

async fn spawn(app: Router) -> Result<String, TestSetupError> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await;
    });

    Ok(format!("http://{addr}"))
}

fn stub_gateway(gateway: Gateway) -> Router {
    Router::new()
        .route("/v1/orders", post(create_gateway_order))
        .with_state(gateway)
}

async fn create_gateway_order(
    State(gateway): State<Gateway>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    match gateway {
        Gateway::Failing => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": { "code": "SERVER_ERROR", "description": "gateway unavailable" }
            })),
        ),
        Gateway::Accepting => (
            StatusCode::OK,
            Json(json!({
                "id": format!("order_it{}", unique_suffix()),
                "amount": body["amount"],
                "currency": body["currency"],
                "receipt": body["receipt"],
                "status": "created"
            })),
        ),
    }
}
