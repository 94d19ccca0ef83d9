//! Error taxonomy for the token issuer.
//!
//! Client errors (`Validation`, `MalformedRequest`) carry the message returned
//! to the caller. Everything else is an internal failure of the request and is
//! only ever logged in detail.

use thiserror::Error;

/// Message returned when the request body cannot be parsed.
pub const MALFORMED_REQUEST_MESSAGE: &str =
    "Invalid JSON request body. Check the integrity of the data.";

/// Errors produced while issuing a token.
#[derive(Error, Debug)]
pub enum IssuerError {
    /// The request is missing a mandatory field or carries an invalid value.
    #[error("{0}")]
    Validation(String),

    /// The request body is not parseable structured data.
    #[error("Invalid JSON request body. Check the integrity of the data.")]
    MalformedRequest,

    /// Reading or writing the key slot failed.
    #[error("Key storage error: {0}")]
    KeyStorage(String),

    /// Key generation or signing failed.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Startup configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The HTTP listener failed.
    #[error("Server error: {0}")]
    Server(String),
}

impl IssuerError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a key storage error.
    #[must_use]
    pub fn key_storage(msg: impl Into<String>) -> Self {
        Self::KeyStorage(msg.into())
    }

    /// Create a crypto error.
    #[must_use]
    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a server error.
    #[must_use]
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// Whether the caller caused this error.
    ///
    /// Client errors are answered with their message; the rest are reported
    /// as internal failures.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::MalformedRequest)
    }

    /// Stable label used in metrics and logs.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::MalformedRequest => "MALFORMED_REQUEST",
            Self::KeyStorage(_) => "KEY_STORAGE",
            Self::Crypto(_) => "CRYPTO",
            Self::Config(_) => "CONFIG",
            Self::Server(_) => "SERVER",
        }
    }
}

impl From<std::io::Error> for IssuerError {
    fn from(err: std::io::Error) -> Self {
        Self::KeyStorage(err.to_string())
    }
}
