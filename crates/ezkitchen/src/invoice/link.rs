//! Signing link and expiry text shown to customers.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

/// Path of the signing page relative to the application base URL.
pub const SIGNING_PATH: &str = "/invoice/sign";

/// Builds `{base_url}/invoice/sign?token={raw}`.
///
/// Tokens are URL-safe base64, so no escaping is needed.
pub fn signing_url(base_url: &str, raw_token: &SecretString) -> SecretString {
    SecretString::from(format!(
        "{}{}?token={}",
        base_url.trim_end_matches('/'),
        SIGNING_PATH,
        raw_token.expose_secret()
    ))
}

/// Formats an expiry like `Jan 2, 2026 3:04 PM`.
pub fn human_expiry(expires_at: DateTime<Utc>) -> String {
    expires_at.format("%b %-d, %Y %-I:%M %p").to_string()
}
