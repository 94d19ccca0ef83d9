//! Wire encodings shared by the JWK exporter and the token signer.
//!
//! Everything here produces the exact bytes a verifier will see, so the
//! functions are deliberately small and free of configuration.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Serialize;

use crate::error::IssuerError;

/// Encode bytes as unpadded URL-safe base64 (RFC 7515 `base64url`).
#[must_use]
pub fn encode_base64_url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded URL-safe base64.
///
/// # Errors
///
/// Returns a validation error if the input contains padding or characters
/// outside the URL-safe alphabet.
pub fn decode_base64_url(text: &str) -> Result<Vec<u8>, IssuerError> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| IssuerError::validation(format!("invalid base64url: {e}")))
}

/// Strip leading zero bytes from a big-endian unsigned integer.
///
/// Zero itself is kept as a single `0x00` byte.
#[must_use]
pub fn minimal_be_bytes(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| *b != 0) {
        Some(first) => &bytes[first..],
        None if bytes.is_empty() => bytes,
        None => &bytes[bytes.len() - 1..],
    }
}

/// Encode a big-endian unsigned integer in its minimal form as base64url.
///
/// This is the JWK encoding for RSA `n` and `e` (RFC 7518 §6.3.1).
#[must_use]
pub fn encode_uint_be(bytes: &[u8]) -> String {
    encode_base64_url(minimal_be_bytes(bytes))
}

/// Serialize a value as compact JSON.
///
/// Struct fields are emitted in declaration order, so the output for a given
/// header or claim set is always byte-identical.
///
/// # Errors
///
/// Returns a crypto error if the value cannot be represented as JSON.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, IssuerError> {
    serde_json::to_vec(value).map_err(|e| IssuerError::crypto(format!("JSON encoding failed: {e}")))
}
