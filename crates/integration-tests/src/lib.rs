//! Integration tests for Sonic Industries.
//!
//! Every test here talks to running servers and is `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p sonic-cli -- migrate
//! cargo run -p sonic-storefront &
//! cargo run -p sonic-admin &
//! cargo test -p sonic-integration-tests -- --ignored --test-threads=1
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - the database both servers use; the staff account
//!   the tests log in with is created here if missing
//! - `STOREFRONT_BASE_URL` - default `http://localhost:3000`
//! - `ADMIN_BASE_URL` - default `http://localhost:3001`
//!
//! Tests create their own catalog rows with unique slugs and codes, so
//! they can run against a database that already holds data.
//!
//! The payment tests only need the database: they run the storefront in
//! process against a stub Razorpay API (see [`storefront`]).

pub mod storefront;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use thiserror::Error;
use uuid::Uuid;

use sonic_admin::db::{RepositoryError, UserRepository};
use sonic_admin::models::NewUser;
use sonic_admin::services::auth::hash_password;
use sonic_core::{Email, UserRole};

/// Staff account the tests authenticate as.
pub const TEST_ADMIN_USERNAME: &str = "integration-admin";
const TEST_ADMIN_EMAIL: &str = "integration-admin@sonic.test";
const TEST_ADMIN_PASSWORD: &str = "integration-password-1";

#[derive(Debug, Error)]
pub enum TestSetupError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storefront setup failed: {0}")]
    Storefront(#[from] sonic_storefront::services::RazorpayError),

    #[error("unexpected response {status}: {body}")]
    Unexpected { status: StatusCode, body: String },
}

/// Base URL for the storefront API.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin API.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A short random suffix for slugs, usernames and coupon codes.
#[must_use]
pub fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string().chars().take(8).collect()
}

pub(crate) fn random_client_ip() -> String {
    let [a, b, c, ..] = Uuid::new_v4().into_bytes();
    format!("10.{a}.{b}.{c}")
}

pub(crate) fn database_url() -> Result<SecretString, TestSetupError> {
    std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| TestSetupError::MissingDatabaseUrl)
}

/// Shared HTTP client plus a logged-in admin token.
pub struct TestContext {
    pub client: Client,
    pub storefront_url: String,
    pub admin_url: String,
    pub admin_token: String,
    /// Sent as `X-Forwarded-For` so each context gets its own rate-limit
    /// bucket on the storefront.
    pub client_ip: String,
}

impl TestContext {
    /// Make sure the test admin exists, then log in.
    ///
    /// # Errors
    ///
    /// Returns `TestSetupError` if the database or the admin server cannot
    /// be reached, or login fails.
    pub async fn new() -> Result<Self, TestSetupError> {
        dotenvy::dotenv().ok();
        ensure_test_admin().await?;

        let client = Client::new();
        let admin_url = admin_base_url();
        let admin_token = login(&client, &admin_url, TEST_ADMIN_USERNAME, TEST_ADMIN_PASSWORD).await?;

        Ok(Self {
            client,
            storefront_url: storefront_base_url(),
            admin_url,
            admin_token,
            client_ip: random_client_ip(),
        })
    }

    /// `path` joined onto the storefront base.
    #[must_use]
    pub fn storefront(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// A storefront GET from this context's client address.
    #[must_use]
    pub fn storefront_get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(self.storefront(path))
            .header("x-forwarded-for", &self.client_ip)
    }

    /// A storefront POST from this context's client address.
    #[must_use]
    pub fn storefront_post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.storefront(path))
            .header("x-forwarded-for", &self.client_ip)
    }

    /// `path` joined onto the admin base.
    #[must_use]
    pub fn admin(&self, path: &str) -> String {
        format!("{}{path}", self.admin_url)
    }

    /// Create a category and a product under it through the admin API.
    ///
    /// Returns the product JSON.
    ///
    /// # Errors
    ///
    /// Returns `TestSetupError` if either create is rejected.
    pub async fn create_product(&self, price: &str) -> Result<Value, TestSetupError> {
        let suffix = unique_suffix();

        let category = expect_json(
            self.client
                .post(self.admin("/api/categories"))
                .bearer_auth(&self.admin_token)
                .json(&json!({ "name": format!("Test Pumps {suffix}") }))
                .send()
                .await?,
            StatusCode::CREATED,
        )
        .await?;

        expect_json(
            self.client
                .post(self.admin("/api/products"))
                .bearer_auth(&self.admin_token)
                .json(&json!({
                    "category_id": category["id"],
                    "name": format!("Test Pump {suffix}"),
                    "price": price,
                    "mrp": "99999.00",
                    "min_quantity": 1,
                    "max_quantity": 5
                }))
                .send()
                .await?,
            StatusCode::CREATED,
        )
        .await
    }
}

/// Exchange credentials for a staff token.
///
/// # Errors
///
/// Returns `TestSetupError::Unexpected` if the admin server refuses.
pub async fn login(client: &Client, admin_url: &str, identifier: &str, password: &str) -> Result<String, TestSetupError> {
    let body = expect_json(
        client
            .post(format!("{admin_url}/api/users/login"))
            .json(&json!({ "identifier": identifier, "password": password }))
            .send()
            .await?,
        StatusCode::OK,
    )
    .await?;

    body["token"]
        .as_str()
        .map(ToOwned::to_owned)
        .ok_or_else(|| TestSetupError::Unexpected {
            status: StatusCode::OK,
            body: body.to_string(),
        })
}

/// Parse a JSON body, failing unless the status matches.
///
/// # Errors
///
/// Returns `TestSetupError::Unexpected` with the body on a status mismatch.
pub async fn expect_json(response: Response, status: StatusCode) -> Result<Value, TestSetupError> {
    let actual = response.status();
    if actual != status {
        let body = response.text().await.unwrap_or_default();
        return Err(TestSetupError::Unexpected { status: actual, body });
    }
    Ok(response.json().await?)
}

async fn ensure_test_admin() -> Result<(), TestSetupError> {
    let pool = sonic_admin::db::create_pool(&database_url()?).await?;
    let users = UserRepository::new(&pool);

    if users.find_by_identifier(TEST_ADMIN_USERNAME).await?.is_some() {
        return Ok(());
    }

    let email = Email::parse(TEST_ADMIN_EMAIL).map_err(|e| TestSetupError::Unexpected {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: e.to_string(),
    })?;
    let password_hash = hash_password(TEST_ADMIN_PASSWORD).map_err(|e| TestSetupError::Unexpected {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: e.to_string(),
    })?;

    let created = users
        .create(&NewUser {
            username: TEST_ADMIN_USERNAME.to_string(),
            email,
            password_hash,
            role: UserRole::Admin,
        })
        .await;

    // Another test process may have created it first
    match created {
        Ok(_) | Err(RepositoryError::Conflict(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
