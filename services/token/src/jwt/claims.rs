//! JOSE header and registered claims.

use serde::{Deserialize, Serialize};

/// Signature algorithm advertised in every header.
pub const ALGORITHM: &str = "RS256";

/// JOSE header. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtHeader {
    /// Token type, always `JWT`.
    pub typ: String,
    /// Signature algorithm.
    pub alg: String,
    /// Intended key use, always `sig`.
    #[serde(rename = "use")]
    pub key_use: String,
    /// Identifier of the signing key.
    pub kid: String,
}

impl JwtHeader {
    /// RS256 signature header for the given key id.
    #[must_use]
    pub fn rs256(kid: impl Into<String>) -> Self {
        Self {
            typ: "JWT".to_string(),
            alg: ALGORITHM.to_string(),
            key_use: "sig".to_string(),
            kid: kid.into(),
        }
    }
}

/// Claims carried by an issued token. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Audience.
    pub aud: String,
    /// Unique token id.
    pub jti: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issuer; the requesting client.
    pub iss: String,
    /// Subject; the requesting client.
    pub sub: String,
}

impl TokenClaims {
    /// Claims for `client_id` asserting itself to `audience`, valid for
    /// `valid_for` seconds from `issued_at`.
    ///
    /// The client is both issuer and subject. A fresh random `jti` is assigned.
    #[must_use]
    pub fn new(client_id: &str, audience: &str, issued_at: i64, valid_for: i64) -> Self {
        Self {
            aud: audience.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: issued_at,
            exp: issued_at + valid_for,
            iss: client_id.to_string(),
            sub: client_id.to_string(),
        }
    }
}
