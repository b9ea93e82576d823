//! Client-side inspection of access token expiry.
//!
//! The signature is never checked. This only avoids a round trip with a token
//! that is certain to be rejected; the server stays the authority.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    exp: serde_json::Number,
}

/// Expiry (`exp` claim) of a JWT access token, if it can be decoded.
pub fn access_token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;

    let seconds = match claims.exp.as_i64() {
        Some(seconds) => seconds,
        None => claims.exp.as_f64()?.floor() as i64,
    };
    DateTime::from_timestamp(seconds, 0)
}

/// True when `now` is at or past the token's expiry, or when the token
/// cannot be decoded.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    match access_token_expiry(token) {
        Some(expires_at) => now >= expires_at,
        None => true,
    }
}

#[cfg(test)]
pub(crate) fn token_expiring_at(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({ "token_type": "access", "exp": exp, "user_id": 1 }).to_string(),
    );
    format!("{}.{}.signature", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_reads_exp_claim() {
        let token = token_expiring_at(1_900_000_000);
        assert_eq!(
            access_token_expiry(&token),
            DateTime::from_timestamp(1_900_000_000, 0)
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let exp = 1_900_000_000;
        let token = token_expiring_at(exp);
        let at = DateTime::from_timestamp(exp, 0).unwrap();

        assert!(!is_expired(&token, at - Duration::seconds(1)));
        assert!(is_expired(&token, at));
        assert!(is_expired(&token, at + Duration::seconds(1)));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = format!("{}==", URL_SAFE_NO_PAD.encode(br#"{"exp":1900000000}"#));
        let token = format!("{}.{}.sig", header, payload);
        assert!(access_token_expiry(&token).is_some());
    }

    #[test]
    fn test_fractional_exp_is_truncated() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = URL_SAFE_NO_PAD.encode(br#"{"exp":1900000000.75}"#);
        let token = format!("{}.{}.sig", header, payload);
        assert_eq!(
            access_token_expiry(&token),
            DateTime::from_timestamp(1_900_000_000, 0)
        );
    }

    #[test]
    fn test_undecodable_tokens_count_as_expired() {
        let now = Utc::now();
        assert!(is_expired("", now));
        assert!(is_expired("not-a-jwt", now));
        assert!(is_expired("a.%%%.c", now));

        let no_exp = format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(b"{}"),
            URL_SAFE_NO_PAD.encode(br#"{"user_id":1}"#)
        );
        assert!(is_expired(&no_exp, now));
    }
}
