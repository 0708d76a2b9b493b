//! Payment tests against an in-process storefront and a stub Razorpay API.
//!
//! These tests require a migrated `PostgreSQL` database (`DATABASE_URL`).
//! No servers need to be running.
//!
//! Run with: cargo test -p sonic-integration-tests --test payment_flow -- --ignored

use reqwest::StatusCode;
use serde_json::json;

use sonic_integration_tests::storefront::{
    Gateway, OrderState, RAZORPAY_KEY_ID, StubbedStorefront, customer, payment_signature,
};
use sonic_integration_tests::{expect_json, unique_suffix};

fn state(order_status: &str, payment_status: &str) -> Option<OrderState> {
    Some(OrderState {
        order_status: order_status.to_string(),
        payment_status: payment_status.to_string(),
    })
}

fn email() -> String {
    format!("pay-{}@sonic.test", unique_suffix())
}

// ============================================================================
// Order creation
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_create_order_returns_gateway_order() {
    let shop = StubbedStorefront::start(Gateway::Accepting, false)
        .await
        .expect("Test setup failed");
    let product_id = shop.insert_product("4500.00").await.expect("Insert failed");
    let token = shop.start_session(product_id, 2).await.expect("Session failed");
    let email = email();

    let payment = shop.create_payment(&token, &email).await.expect("Create failed");

    assert!(payment.razorpay_order_id.starts_with("order_it"));
    assert_eq!(payment.currency, "INR");
    assert_eq!(payment.key_id, RAZORPAY_KEY_ID);
    assert!(payment.amount >= 900_000, "amount {} below subtotal", payment.amount);
    assert_eq!(
        shop.order_state(&payment.order_number).await.expect("Query failed"),
        state("pending", "pending")
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_gateway_failure_leaves_no_order() {
    let shop = StubbedStorefront::start(Gateway::Failing, false)
        .await
        .expect("Test setup failed");
    let product_id = shop.insert_product("4500.00").await.expect("Insert failed");
    let token = shop.start_session(product_id, 1).await.expect("Session failed");
    let email = email();

    for _ in 0..2 {
        let resp = shop
            .post("/api/payment/create-order")
            .bearer_auth(&token)
            .json(&customer(&email))
            .send()
            .await
            .expect("Request failed");

        // The second attempt reuses the session; it must not see a conflict
        let body = expect_json(resp, StatusCode::BAD_GATEWAY)
            .await
            .expect("Gateway failure not reported");
        assert_eq!(body["error"], "Payment gateway error");
    }

    assert_eq!(shop.count_orders_for(&email).await.expect("Count failed"), 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_session_places_one_order() {
    let shop = StubbedStorefront::start(Gateway::Accepting, false)
        .await
        .expect("Test setup failed");
    let product_id = shop.insert_product("1200.00").await.expect("Insert failed");
    let token = shop.start_session(product_id, 1).await.expect("Session failed");
    let email = email();

    let send = || {
        shop.post("/api/orders")
            .bearer_auth(&token)
            .json(&customer(&email))
            .send()
    };

    expect_json(send().await.expect("Request failed"), StatusCode::CREATED)
        .await
        .expect("First order failed");

    let body = expect_json(send().await.expect("Request failed"), StatusCode::CONFLICT)
        .await
        .expect("Second order was not rejected");
    assert_eq!(body["error"], "checkout session already used");

    let resp = shop
        .post("/api/payment/create-order")
        .bearer_auth(&token)
        .json(&customer(&email))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    assert_eq!(shop.count_orders_for(&email).await.expect("Count failed"), 1);
}

// ============================================================================
// Verification
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_verify_rejects_bad_signature() {
    let shop = StubbedStorefront::start(Gateway::Accepting, false)
        .await
        .expect("Test setup failed");
    let product_id = shop.insert_product("4500.00").await.expect("Insert failed");
    let token = shop.start_session(product_id, 1).await.expect("Session failed");
    let payment = shop.create_payment(&token, &email()).await.expect("Create failed");

    let resp = shop
        .post("/api/payment/verify")
        .json(&json!({
            "razorpay_order_id": payment.razorpay_order_id,
            "razorpay_payment_id": "pay_forged",
            "razorpay_signature": "00".repeat(32),
        }))
        .send()
        .await
        .expect("Request failed");

    let body = expect_json(resp, StatusCode::BAD_REQUEST)
        .await
        .expect("Bad signature accepted");
    assert_eq!(body["error"], "Payment verification failed");
    assert_eq!(
        shop.order_state(&payment.order_number).await.expect("Query failed"),
        state("pending", "failed")
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_verify_then_spin() {
    let shop = StubbedStorefront::start(Gateway::Accepting, false)
        .await
        .expect("Test setup failed");
    let product_id = shop.insert_product("4500.00").await.expect("Insert failed");
    let token = shop.start_session(product_id, 1).await.expect("Session failed");
    let payment = shop.create_payment(&token, &email()).await.expect("Create failed");

    let spin = || {
        shop.post("/api/payment/spin-reward")
            .json(&json!({ "order_number": payment.order_number }))
            .send()
    };

    // Unpaid prepaid orders cannot spin
    let body = expect_json(spin().await.expect("Request failed"), StatusCode::CONFLICT)
        .await
        .expect("Unpaid spin allowed");
    assert_eq!(body["error"], "Order is not complete yet");

    let payment_id = format!("pay_it{}", unique_suffix());
    let order = expect_json(
        shop.post("/api/payment/verify")
            .json(&json!({
                "razorpay_order_id": payment.razorpay_order_id,
                "razorpay_payment_id": payment_id,
                "razorpay_signature": payment_signature(&payment.razorpay_order_id, &payment_id),
            }))
            .send()
            .await
            .expect("Request failed"),
        StatusCode::OK,
    )
    .await
    .expect("Verify failed");

    assert_eq!(order["payment_status"], "paid");
    assert_eq!(order["order_status"], "placed");
    assert_eq!(
        shop.order_state(&payment.order_number).await.expect("Query failed"),
        state("placed", "paid")
    );

    let first = expect_json(spin().await.expect("Request failed"), StatusCode::OK)
        .await
        .expect("Spin failed");
    assert_eq!(first["already_spun"], false);

    let second = expect_json(spin().await.expect("Request failed"), StatusCode::OK)
        .await
        .expect("Repeat spin failed");
    assert_eq!(second["already_spun"], true);
    assert_eq!(second["reward"], first["reward"]);
}

// ============================================================================
// Webhooks
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_webhook_captured_marks_paid() {
    let shop = StubbedStorefront::start(Gateway::Accepting, true)
        .await
        .expect("Test setup failed");
    let product_id = shop.insert_product("4500.00").await.expect("Insert failed");
    let token = shop.start_session(product_id, 1).await.expect("Session failed");
    let payment = shop.create_payment(&token, &email()).await.expect("Create failed");

    let resp = shop
        .send_webhook("payment.captured", &payment.razorpay_order_id, "pay_hook_captured")
        .await
        .expect("Webhook failed");
    let ack = expect_json(resp, StatusCode::OK).await.expect("Webhook rejected");

    assert_eq!(ack["status"], "ok");
    assert_eq!(
        shop.order_state(&payment.order_number).await.expect("Query failed"),
        state("placed", "paid")
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_webhook_failed_marks_failed() {
    let shop = StubbedStorefront::start(Gateway::Accepting, true)
        .await
        .expect("Test setup failed");
    let product_id = shop.insert_product("4500.00").await.expect("Insert failed");
    let token = shop.start_session(product_id, 1).await.expect("Session failed");
    let payment = shop.create_payment(&token, &email()).await.expect("Create failed");

    let resp = shop
        .send_webhook("payment.failed", &payment.razorpay_order_id, "pay_hook_failed")
        .await
        .expect("Webhook failed");
    expect_json(resp, StatusCode::OK).await.expect("Webhook rejected");

    assert_eq!(
        shop.order_state(&payment.order_number).await.expect("Query failed"),
        state("pending", "failed")
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_webhook_rejects_bad_signature() {
    let shop = StubbedStorefront::start(Gateway::Accepting, true)
        .await
        .expect("Test setup failed");
    let product_id = shop.insert_product("4500.00").await.expect("Insert failed");
    let token = shop.start_session(product_id, 1).await.expect("Session failed");
    let payment = shop.create_payment(&token, &email()).await.expect("Create failed");

    let resp = shop
        .post("/api/payment/webhook")
        .header("content-type", "application/json")
        .header("x-razorpay-signature", "deadbeef")
        .body(
            json!({
                "event": "payment.captured",
                "payload": { "payment": { "entity": {
                    "id": "pay_forged",
                    "order_id": payment.razorpay_order_id
                } } }
            })
            .to_string(),
        )
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        shop.order_state(&payment.order_number).await.expect("Query failed"),
        state("pending", "pending")
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_webhook_not_found_without_secret() {
    let shop = StubbedStorefront::start(Gateway::Accepting, false)
        .await
        .expect("Test setup failed");

    let resp = shop
        .send_webhook("payment.captured", "order_unknown", "pay_unknown")
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
