//! HTTP route handlers for admin.
//!
//! Every route requires `Authorization: Bearer <ADMIN_API_TOKEN>`.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Health check
//! GET  /health/ready                  - Readiness check (database)
//!
//! # Products
//! GET    /products                    - List (?category=&q=&flag=)
//! POST   /products                    - Create
//! POST   /products/import             - CSV bulk import (?dryRun=true)
//! GET    /products/{id}               - Detail
//! PUT    /products/{id}               - Replace
//! DELETE /products/{id}               - Delete
//!
//! # Categories
//! GET    /categories                  - List
//! POST   /categories                  - Create
//! GET    /categories/{slug}           - Detail
//! PUT    /categories/{slug}           - Replace
//! DELETE /categories/{slug}           - Delete
//!
//! # Homepage sections
//! GET    /sections                    - List (active and inactive)
//! POST   /sections                    - Append a section
//! POST   /sections/reorder            - Apply a full new order
//! PUT    /sections/{key}/products     - Replace the product list
//! PUT    /sections/{key}/active       - Toggle visibility
//! DELETE /sections/{key}              - Delete
//! ```

pub mod categories;
pub mod products;
pub mod sections;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/import", post(products::import))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route(
            "/{slug}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
}

/// Create the homepage section routes router.
pub fn section_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(sections::index).post(sections::create))
        .route("/reorder", post(sections::reorder))
        .route("/{key}/products", put(sections::set_products))
        .route("/{key}/active", put(sections::set_active))
        .route("/{key}", axum::routing::delete(sections::delete))
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/sections", section_routes())
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::tests::{TEST_TOKEN, test_config};
    use crate::state::AppState;

    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/graphica_test")
            .unwrap();
        super::routes().with_state(AppState::new(test_config(), pool))
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        for uri in ["/products", "/categories", "/sections"] {
            let response = app().oneshot(get(uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        }
    }

    #[tokio::test]
    async fn wrong_token_is_unauthorized() {
        let response = app()
            .oneshot(get("/products", Some("adm_not_the_right_token_at_all_00")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn import_requires_token() {
        let request = Request::builder()
            .method("POST")
            .uri("/products/import?dryRun=true")
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from("name,basePrice,categoryId\nFlyer,10,flyers\n"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_section_key_is_rejected_before_lookup() {
        let request = Request::builder()
            .method("DELETE")
            .uri("/sections/Best-Sellers")
            .header(header::AUTHORIZATION, format!("Bearer {TEST_TOKEN}"))
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
