//! Token Issuer library.
//!
//! Issues short-lived RS256 JWTs for a client/audience pair together with the
//! JWK that verifies them, managing a single persisted RSA signing key with
//! on-demand rotation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod issuance;
pub mod jwks;
pub mod jwt;
pub mod keystore;
pub mod metrics;
pub mod shutdown;
pub mod telemetry;

// Re-exports for convenience
pub use config::Config;
pub use error::IssuerError;
pub use issuance::{IssuanceRequest, IssuanceService, IssuedToken};
pub use keystore::KeyStore;
