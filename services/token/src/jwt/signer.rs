//! RS256 compact JWS construction.

use sha2::{Digest, Sha256};

use crate::codec;
use crate::error::IssuerError;
use crate::jwt::claims::{JwtHeader, TokenClaims};
use crate::keystore::SigningKey;

/// Builds and signs compact tokens (`header.payload.signature`).
pub struct TokenSigner;

impl TokenSigner {
    /// Sign `claims` with `key`, advertising `kid` in the header.
    ///
    /// # Errors
    ///
    /// Returns a crypto error if serialization or signing fails.
    pub fn issue(claims: &TokenClaims, kid: &str, key: &SigningKey) -> Result<String, IssuerError> {
        let header = JwtHeader::rs256(kid);
        let signing_input = Self::signing_input(&header, claims)?;

        let digest = Sha256::digest(signing_input.as_bytes());
        let signature = key.sign_digest(&digest)?;

        Ok(format!(
            "{signing_input}.{}",
            codec::encode_base64_url(&signature)
        ))
    }

    /// The first two segments of the token, as signed.
    ///
    /// # Errors
    ///
    /// Returns a crypto error if the header or claims cannot be serialized.
    pub fn signing_input(header: &JwtHeader, claims: &TokenClaims) -> Result<String, IssuerError> {
        let header = codec::encode_base64_url(&codec::canonical_json(header)?);
        let payload = codec::encode_base64_url(&codec::canonical_json(claims)?);
        Ok(format!("{header}.{payload}"))
    }
}
