//! Issuance pipeline: defaults, validation, key resolution, signing.

pub mod request;
pub mod service;
pub mod validator;

pub use request::{IssuanceDefaults, IssuanceRequest, ResolvedRequest, DEFAULT_VALID_FOR};
pub use service::{IssuanceService, IssuedToken};
pub use validator::{IssuanceValidator, ValidatedRequest, MAX_VALID_FOR};
