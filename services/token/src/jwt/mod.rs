//! Token header, claims and RS256 signing.

pub mod claims;
pub mod signer;

pub use claims::{JwtHeader, TokenClaims, ALGORITHM};
pub use signer::TokenSigner;
