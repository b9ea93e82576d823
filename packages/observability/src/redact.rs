//! Secret redaction for structured log fields.

/// Replacement written in place of a sensitive value.
pub const REDACTED: &str = "[REDACTED]";

const DENYLIST_KEYS: [&str; 9] = [
    "token",
    "access_token",
    "refresh_token",
    "authorization",
    "cookie",
    "password",
    "password2",
    "secret",
    "refresh",
];

/// Returns true when a field name denotes a credential.
///
/// Matching is case-insensitive and also catches suffixed names such as
/// `new_access_token` or `bearer_token`.
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    DENYLIST_KEYS
        .iter()
        .any(|denied| key == *denied || key.ends_with(&format!("_{}", denied)))
}
