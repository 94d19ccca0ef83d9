//! Public key export in JWK form.

pub mod exporter;

pub use exporter::{Jwk, JwkExporter};
