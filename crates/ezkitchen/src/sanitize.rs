//! Helpers for sanitizing data before it enters log events and span fields.
//!
//! Signing links are bearer credentials. These functions make sure raw tokens
//! and full customer addresses never reach the logs.

use crate::invoice::token::TokenHash;

/// Length of the token fingerprint, in hex characters.
const FINGERPRINT_LEN: usize = 12;

/// Returns a short prefix of the token's stored hash.
///
/// Safe for span fields: it correlates with the `token_hash` column without
/// revealing anything that could be used to sign.
pub fn token_fingerprint(hash: &TokenHash) -> String {
    hash.as_str().chars().take(FINGERPRINT_LEN).collect()
}

/// Replaces the `token` query value of a signing link.
///
/// - `https://app.example/invoice/sign?token=abc` → `https://app.example/invoice/sign?token=****`
/// - `https://app.example/invoice/sign` → unchanged
pub fn redact_signing_url(url: &str) -> String {
    let Some(query_start) = url.find('?') else {
        return url.to_string();
    };

    let (base, query) = url.split_at(query_start + 1);
    let redacted: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("token", _)) => "token=****".to_string(),
            _ => pair.to_string(),
        })
        .collect();

    format!("{}{}", base, redacted.join("&"))
}

/// Masks the local part of an email address, keeping its first character.
///
/// - `cora@example.com` → `c***@example.com`
/// - `not-an-email` → `***`
pub fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        _ => "***".to_string(),
    }
}
