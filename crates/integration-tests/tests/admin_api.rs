//! Integration tests for the admin API.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`sonic-cli migrate`)
//! - The admin server running (cargo run -p sonic-admin)
//! - The storefront running for the order-dependent cases
//!
//! Run with: cargo test -p sonic-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use sonic_integration_tests::{
    TEST_ADMIN_USERNAME, TestContext, expect_json, login, unique_suffix,
};

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_login_and_me() {
    let ctx = TestContext::new().await.expect("Test setup failed");

    let me = expect_json(
        ctx.client
            .get(ctx.admin("/api/users/me"))
            .bearer_auth(&ctx.admin_token)
            .send()
            .await
            .expect("Me request failed"),
        StatusCode::OK,
    )
    .await
    .expect("Me failed");

    assert_eq!(me["username"], TEST_ADMIN_USERNAME);
    assert_eq!(me["role"], "admin");
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_bad_credentials_are_indistinguishable() {
    let ctx = TestContext::new().await.expect("Test setup failed");

    let mut messages = Vec::new();
    for identifier in [TEST_ADMIN_USERNAME, "no-such-user"] {
        let resp = ctx
            .client
            .post(ctx.admin("/api/users/login"))
            .json(&json!({ "identifier": identifier, "password": "wrong-password" }))
            .send()
            .await
            .expect("Login request failed");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = resp.json().await.expect("Invalid JSON");
        messages.push(body["error"].clone());
    }

    assert_eq!(messages[0], messages[1]);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_routes_require_token() {
    let ctx = TestContext::new().await.expect("Test setup failed");

    for path in ["/api/dashboard/summary", "/api/orders", "/api/users/me"] {
        let resp = ctx
            .client
            .get(ctx.admin(path))
            .send()
            .await
            .expect("Request failed");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_roles_and_user_management() {
    let ctx = TestContext::new().await.expect("Test setup failed");
    let username = format!("viewer-{}", unique_suffix());
    let password = "viewer-password-1";

    let viewer = expect_json(
        ctx.client
            .post(ctx.admin("/api/users"))
            .bearer_auth(&ctx.admin_token)
            .json(&json!({
                "username": username,
                "email": format!("{username}@sonic.test"),
                "password": password
            }))
            .send()
            .await
            .expect("Create user failed"),
        StatusCode::CREATED,
    )
    .await
    .expect("User not created");
    assert_eq!(viewer["role"], "viewer");
    assert!(viewer.get("password_hash").is_none());

    // Same username again
    let resp = ctx
        .client
        .post(ctx.admin("/api/users"))
        .bearer_auth(&ctx.admin_token)
        .json(&json!({
            "username": username,
            "email": format!("other-{username}@sonic.test"),
            "password": password
        }))
        .send()
        .await
        .expect("Create user failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Short password
    let resp = ctx
        .client
        .post(ctx.admin("/api/users"))
        .bearer_auth(&ctx.admin_token)
        .json(&json!({
            "username": format!("short-{}", unique_suffix()),
            "email": format!("short-{}@sonic.test", unique_suffix()),
            "password": "short"
        }))
        .send()
        .await
        .expect("Create user failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // A viewer can read but not write, and cannot manage users
    let viewer_token = login(&ctx.client, &ctx.admin_url, &username, password)
        .await
        .expect("Viewer login failed");

    let resp = ctx
        .client
        .get(ctx.admin("/api/products"))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .client
        .post(ctx.admin("/api/categories"))
        .bearer_auth(&viewer_token)
        .json(&json!({ "name": "Not allowed" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = ctx
        .client
        .get(ctx.admin("/api/users"))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Deleting the viewer revokes its token immediately
    let resp = ctx
        .client
        .delete(ctx.admin(&format!("/api/users/{}", viewer["id"])))
        .bearer_auth(&ctx.admin_token)
        .send()
        .await
        .expect("Delete failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ctx
        .client
        .get(ctx.admin("/api/users/me"))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_cannot_delete_self() {
    let ctx = TestContext::new().await.expect("Test setup failed");

    let me = expect_json(
        ctx.client
            .get(ctx.admin("/api/users/me"))
            .bearer_auth(&ctx.admin_token)
            .send()
            .await
            .expect("Me request failed"),
        StatusCode::OK,
    )
    .await
    .expect("Me failed");

    let resp = ctx
        .client
        .delete(ctx.admin(&format!("/api/users/{}", me["id"])))
        .bearer_auth(&ctx.admin_token)
        .send()
        .await
        .expect("Delete failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_catalog_crud() {
    let ctx = TestContext::new().await.expect("Test setup failed");
    let product = ctx.create_product("2499.00").await.expect("Product not created");
    let product_url = ctx.admin(&format!("/api/products/{}", product["id"]));
    let category_id = product["category_id"].clone();

    assert_eq!(product["min_quantity"], 1);
    assert_eq!(product["max_quantity"], 5);
    assert!(product["category_name"].is_string());

    // The category cannot go while it has products
    let category_url = ctx.admin(&format!("/api/categories/{category_id}"));
    let resp = ctx
        .client
        .delete(&category_url)
        .bearer_auth(&ctx.admin_token)
        .send()
        .await
        .expect("Delete failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Full replacement, slug kept from the original
    let updated = expect_json(
        ctx.client
            .put(&product_url)
            .bearer_auth(&ctx.admin_token)
            .json(&json!({
                "category_id": category_id,
                "name": "Renamed pump",
                "slug": product["slug"],
                "price": "2299.00",
                "is_active": false
            }))
            .send()
            .await
            .expect("Update failed"),
        StatusCode::OK,
    )
    .await
    .expect("Product not updated");
    assert_eq!(updated["name"], "Renamed pump");
    assert_eq!(updated["price"], "2299.00");
    assert_eq!(updated["is_active"], false);

    // Invalid bounds and unknown categories are rejected
    for body in [
        json!({ "category_id": category_id, "name": "X", "price": "10", "min_quantity": 3, "max_quantity": 2 }),
        json!({ "category_id": 2_000_000_000, "name": "X", "price": "10" }),
        json!({ "category_id": category_id, "name": "X", "price": "0" }),
    ] {
        let resp = ctx
            .client
            .post(ctx.admin("/api/products"))
            .bearer_auth(&ctx.admin_token)
            .json(&body)
            .send()
            .await
            .expect("Create failed");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    // Search finds it by name
    let found = expect_json(
        ctx.client
            .get(ctx.admin(&format!("/api/products?category_id={category_id}&q=renamed")))
            .bearer_auth(&ctx.admin_token)
            .send()
            .await
            .expect("List failed"),
        StatusCode::OK,
    )
    .await
    .expect("Products not listed");
    assert_eq!(found.as_array().map(Vec::len), Some(1));

    // Remove the product, then the category
    for url in [&product_url, &category_url] {
        let resp = ctx
            .client
            .delete(url)
            .bearer_auth(&ctx.admin_token)
            .send()
            .await
            .expect("Delete failed");
        assert_eq!(resp.status(), StatusCode::NO_CONTENT, "{url}");
    }

    let resp = ctx
        .client
        .get(&product_url)
        .bearer_auth(&ctx.admin_token)
        .send()
        .await
        .expect("Get failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_duplicate_deal_code_conflicts() {
    let ctx = TestContext::new().await.expect("Test setup failed");
    let code = format!("dup-{}", unique_suffix());

    let deal = expect_json(
        ctx.client
            .post(ctx.admin("/api/deals"))
            .bearer_auth(&ctx.admin_token)
            .json(&json!({ "title": "Any product", "coupon_code": code, "deal_price": "0" }))
            .send()
            .await
            .expect("Deal request failed"),
        StatusCode::CREATED,
    )
    .await
    .expect("Deal not created");
    assert_eq!(deal["coupon_code"], code.to_uppercase());
    assert_eq!(deal["is_live"], true);

    // Same code in another case
    let resp = ctx
        .client
        .post(ctx.admin("/api/deals"))
        .bearer_auth(&ctx.admin_token)
        .json(&json!({ "title": "Again", "coupon_code": code.to_uppercase(), "deal_price": "10" }))
        .send()
        .await
        .expect("Deal request failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = ctx
        .client
        .delete(ctx.admin(&format!("/api/deals/{}", deal["id"])))
        .bearer_auth(&ctx.admin_token)
        .send()
        .await
        .expect("Delete failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// ============================================================================
// Orders and dashboard
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_order_list_pagination() {
    let ctx = TestContext::new().await.expect("Test setup failed");

    let page = expect_json(
        ctx.client
            .get(ctx.admin("/api/orders?page=1&per_page=500"))
            .bearer_auth(&ctx.admin_token)
            .send()
            .await
            .expect("List failed"),
        StatusCode::OK,
    )
    .await
    .expect("Orders not listed");

    assert_eq!(page["page"], 1);
    assert_eq!(page["per_page"], 100);
    assert!(page["total"].is_i64());
    assert!(page["items"].as_array().is_some_and(|items| items.len() <= 100));

    let resp = ctx
        .client
        .get(ctx.admin("/api/orders?status=misplaced"))
        .bearer_auth(&ctx.admin_token)
        .send()
        .await
        .expect("List failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_empty_status_update_rejected() {
    let ctx = TestContext::new().await.expect("Test setup failed");

    let resp = ctx
        .client
        .put(ctx.admin("/api/orders/1/status"))
        .bearer_auth(&ctx.admin_token)
        .json(&json!({}))
        .send()
        .await
        .expect("Update failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_dashboard_summary_shape() {
    let ctx = TestContext::new().await.expect("Test setup failed");

    let summary = expect_json(
        ctx.client
            .get(ctx.admin("/api/dashboard/summary"))
            .bearer_auth(&ctx.admin_token)
            .send()
            .await
            .expect("Summary failed"),
        StatusCode::OK,
    )
    .await
    .expect("Summary not returned");

    for key in ["products", "categories", "open_leads", "orders"] {
        assert!(summary["counts"][key].is_i64(), "counts.{key}");
    }
    assert!(summary["orders_by_status"].is_array());
    assert!(summary["paid_revenue"].is_string());
    assert!(summary["cod_outstanding"].is_string());
    assert!(
        summary["recent_orders"]
            .as_array()
            .is_some_and(|orders| orders.len() <= 10)
    );
}
