//! End-to-end tests for Graphica.
//!
//! The tests talk HTTP to running binaries and are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p graphica-cli -- migrate
//! cargo run -p graphica-storefront &
//! cargo run -p graphica-admin &
//! cargo test -p graphica-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TEST_URL` - default `http://localhost:3000`
//! - `ADMIN_TEST_URL` - default `http://localhost:3001`
//! - `ADMIN_API_TOKEN` - bearer token the admin server was started with
//! - `DATABASE_URL` - database the storefront runs against (webhook tests)
//! - `STRIPE_WEBHOOK_SECRET` - webhook secret the storefront was started with

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use sha2::Sha256;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_TEST_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A storefront client that keeps its session cookie between requests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn storefront_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// An admin client that sends the bearer token on every request.
///
/// # Panics
///
/// Panics if `ADMIN_API_TOKEN` is unset or the client cannot be built.
#[must_use]
pub fn admin_client() -> Client {
    let token = std::env::var("ADMIN_API_TOKEN").expect("ADMIN_API_TOKEN must be set");
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("token is a valid header"),
    );
    Client::builder()
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// A short random suffix so repeated runs don't collide.
#[must_use]
pub fn unique(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &id[..8])
}

/// A small pool on the storefront's database, for seeding and inspecting rows.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or the database is unreachable.
pub async fn database_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to database")
}

/// A `Stripe-Signature` header for `payload`, timestamped now.
///
/// # Panics
///
/// Panics if `STRIPE_WEBHOOK_SECRET` is unset.
#[must_use]
pub fn stripe_signature(payload: &str) -> String {
    let secret =
        std::env::var("STRIPE_WEBHOOK_SECRET").expect("STRIPE_WEBHOOK_SECRET must be set");
    let timestamp = Utc::now().timestamp();
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload.as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}
