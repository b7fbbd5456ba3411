//! Storefront flows against a running storefront server.

use graphica_integration_tests::{storefront_client, storefront_url, unique};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = reqwest::get(format!("{}/health", storefront_url()))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_login_logout() {
    let client = storefront_client();
    let email = format!("{}@example.test", unique("buyer"));
    let credentials = json!({ "email": email, "password": "Tr1cky-Passw0rd!" });

    let resp = client
        .post(format!("{}/auth/register", storefront_url()))
        .json(&credentials)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let me: Value = client
        .get(format!("{}/auth/me", storefront_url()))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");
    assert_eq!(me["customer"]["email"], email.as_str());

    let resp = client
        .post(format!("{}/auth/register", storefront_url()))
        .json(&credentials)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .post(format!("{}/auth/logout", storefront_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .post(format!("{}/auth/login", storefront_url()))
        .json(&json!({ "email": email, "password": "wrong" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server and a seeded catalog"]
async fn test_cart_merges_identical_lines() {
    let client = storefront_client();

    let products: Vec<Value> = client
        .get(format!("{}/products", storefront_url()))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");
    let Some(product) = products.first() else {
        return;
    };
    let add = json!({ "productId": product["id"], "quantity": 2 });

    for _ in 0..2 {
        let resp = client
            .post(format!("{}/cart/add", storefront_url()))
            .json(&add)
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let cart: Value = client
        .get(format!("{}/cart", storefront_url()))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");
    assert_eq!(cart["count"], 1);
    assert_eq!(cart["lines"][0]["quantity"], 4);

    let line_id = cart["lines"][0]["lineId"].clone();
    let cart: Value = client
        .post(format!("{}/cart/update", storefront_url()))
        .json(&json!({ "lineId": line_id, "quantity": 0 }))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");
    assert_eq!(cart["count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_requires_login() {
    let resp = storefront_client()
        .post(format!("{}/checkout", storefront_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unsigned_webhook_is_rejected() {
    let resp = storefront_client()
        .post(format!("{}/webhooks/stripe", storefront_url()))
        .body(r#"{"id":"evt_1","type":"checkout.session.completed"}"#)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
