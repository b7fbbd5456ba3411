//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Catalog
//! GET  /home                   - Homepage sections
//! GET  /products               - Product listing (?category=&q=&flag=)
//! GET  /products/{id}          - Product detail with tier prices
//! GET  /categories             - Category listing (?menu=true)
//!
//! # Cart (session)
//! GET  /cart                   - Cart lines, total and count
//! POST /cart/add               - Add a product selection
//! POST /cart/update            - Set a line's quantity (<= 0 removes)
//! POST /cart/remove            - Remove a line
//! POST /cart/clear             - Empty the cart
//!
//! # Auth
//! POST /auth/register          - Register and log in
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//! GET  /auth/me                - Current customer, if any
//!
//! # Checkout
//! POST /checkout               - Create a payment session (requires auth)
//! GET  /checkout/success       - Return page; clears the cart
//!
//! # Account (requires auth)
//! GET    /account/orders              - Order history
//! GET    /account/orders/{id}         - Order detail
//! GET    /account/favorites           - Favorite products
//! PUT    /account/favorites/{id}      - Add a favorite
//! DELETE /account/favorites/{id}      - Remove a favorite
//!
//! # Webhooks
//! POST /webhooks/stripe        - Payment processor events
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod home;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(home::show))
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .route("/categories", get(catalog::categories))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::create))
        .route("/success", get(checkout::success))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route("/favorites", get(account::favorites))
        .route(
            "/favorites/{id}",
            put(account::add_favorite).delete(account::remove_favorite),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
        .route("/webhooks/stripe", post(webhooks::stripe))
}
