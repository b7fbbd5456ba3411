//! Webhook signature verification.
//!
//! Stripe signs `"{timestamp}.{payload}"` with HMAC-SHA256 and sends the
//! result in the `Stripe-Signature` header as `t=...,v1=...`. Several `v1`
//! entries may be present while a secret is being rolled.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

/// Maximum accepted age of a signed delivery, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing or malformed signature header")]
    MalformedHeader,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a webhook payload against its signature header at time `now`
/// (unix seconds).
///
/// # Errors
///
/// Returns [`SignatureError`] if the header is malformed, the timestamp is
/// more than [`SIGNATURE_TOLERANCE_SECS`] away from `now`, or no `v1`
/// signature matches.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::MalformedHeader)?;
    if now.abs_diff(ts) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(SignatureError::Expired);
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    if signatures
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate))
    {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const SECRET: &str = "whsec_Gx7pQ2mK9vL4tR8nB3cJ6yH1";
    const NOW: i64 = 1_767_225_600;

    pub(crate) fn sign(secret: &str, payload: &[u8], timestamp: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign(SECRET, payload, NOW);
        assert_eq!(verify_signature(SECRET, payload, &header, NOW), Ok(()));
    }

    #[test]
    fn rejects_wrong_secret() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign("whsec_other", payload, NOW);
        assert_eq!(
            verify_signature(SECRET, payload, &header, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_modified_payload() {
        let header = sign(SECRET, br#"{"amount":100}"#, NOW);
        assert_eq!(
            verify_signature(SECRET, br#"{"amount":1}"#, &header, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_old_timestamp() {
        let payload = b"{}";
        let header = sign(SECRET, payload, NOW - 600);
        assert_eq!(
            verify_signature(SECRET, payload, &header, NOW),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn extreme_timestamps_are_expired() {
        for ts in [i64::MIN, i64::MAX] {
            assert_eq!(
                verify_signature("whsec_x", b"{}", &format!("t={ts},v1=00"), NOW),
                Err(SignatureError::Expired),
                "timestamp {ts}"
            );
        }
        let future = sign(SECRET, b"{}", NOW + 600);
        assert_eq!(
            verify_signature(SECRET, b"{}", &future, NOW),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn accepts_any_matching_v1_during_rollover() {
        let payload = b"{}";
        let valid = sign(SECRET, payload, NOW);
        let v1 = valid.split_once(",v1=").unwrap().1;
        let header = format!("t={NOW},v1={},v1={v1}", "0".repeat(64));
        assert_eq!(verify_signature(SECRET, payload, &header, NOW), Ok(()));
    }

    #[test]
    fn rejects_malformed_headers() {
        let timestamp_only = format!("t={NOW}");
        for header in ["", "garbage", "v1=abc", timestamp_only.as_str(), "t=abc,v1=00"] {
            assert_eq!(
                verify_signature(SECRET, b"{}", header, NOW),
                Err(SignatureError::MalformedHeader),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "ab"));
    }
}
