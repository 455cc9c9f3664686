//! Signing token generation and hashing.
//!
//! A raw token is 32 bytes from the OS random source, encoded as unpadded
//! URL-safe base64 so it can sit in a query string as-is. Only the hex
//! SHA-256 of the encoded string is ever persisted.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use secrecy::SecretString;
use sha2::{Digest, Sha256};

use super::error::InvoiceError;

/// Random bytes per token (256 bits of entropy).
pub const TOKEN_BYTES: usize = 32;

/// Hex SHA-256 of a raw token, as stored in `invoice_access_tokens.token_hash`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenHash(String);

impl TokenHash {
    pub fn of(raw: &str) -> Self {
        Self(hex::encode(Sha256::digest(raw.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenHash({}..)", &self.0[..8.min(self.0.len())])
    }
}

/// A freshly minted token. `raw` is handed out exactly once.
#[derive(Debug)]
pub struct GeneratedToken {
    pub raw: SecretString,
    pub hash: TokenHash,
}

/// Mints a new token from the operating system's secure random source.
pub fn generate() -> Result<GeneratedToken, InvoiceError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| InvoiceError::Randomness(e.to_string()))?;

    let raw = URL_SAFE_NO_PAD.encode(bytes);
    let hash = TokenHash::of(&raw);

    Ok(GeneratedToken {
        raw: SecretString::from(raw),
        hash,
    })
}
