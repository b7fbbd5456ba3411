//! Bearer-token authentication for admin routes.
//!
//! The administrator claim is a single shared token presented as
//! `Authorization: Bearer <token>`.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use crate::state::AppState;

/// Extractor that requires the admin bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(_admin: RequireAdmin) -> impl IntoResponse {
///     "ok"
/// }
/// ```
#[derive(Debug)]
pub struct RequireAdmin;

/// Returned when the token is missing or wrong.
#[derive(Debug)]
pub struct AdminRejection;

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            Json(serde_json::json!({ "error": "Administrator token required" })),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AdminRejection)?;

        if token_matches(presented.trim(), state.config().api_token.expose_secret()) {
            Ok(Self)
        } else {
            tracing::warn!("Rejected admin request with invalid token");
            Err(AdminRejection)
        }
    }
}

/// Compare digests so neither the content nor the length of the expected
/// token leaks through timing.
fn token_matches(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    constant_time_compare(&a, &b)
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_tokens() {
        assert!(token_matches("adm_token_value", "adm_token_value"));
        assert!(!token_matches("adm_token_valuf", "adm_token_value"));
        assert!(!token_matches("adm", "adm_token_value"));
        assert!(!token_matches("", "adm_token_value"));
    }

    #[test]
    fn constant_time_compare_lengths() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abcd"));
    }
}
