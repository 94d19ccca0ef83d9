//! JWK export of the signing key's public half.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::keystore::SigningKey;

/// Public verification key for an issued token.
///
/// Only the members a verifier needs to rebuild the RSA public key are
/// carried; the algorithm is fixed to RS256.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key identifier, matches the token header `kid`.
    pub kid: String,
    /// Public exponent, minimal big-endian base64url.
    pub e: String,
    /// Modulus, minimal big-endian base64url.
    pub n: String,
}

/// Derives a [`Jwk`] from the signing key.
pub struct JwkExporter;

impl JwkExporter {
    /// Export the public half of `key` under `kid`.
    #[must_use]
    pub fn export(key: &SigningKey, kid: &str) -> Jwk {
        Jwk {
            kid: kid.to_string(),
            e: codec::encode_uint_be(&key.exponent_be()),
            n: codec::encode_uint_be(&key.modulus_be()),
        }
    }
}
