//! Durable slot holding the one persisted signing key.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::error::IssuerError;

/// Storage backend for the serialized private key.
///
/// A slot holds at most one PEM document. `write` replaces the previous
/// contents atomically: a concurrent `read` observes either the old or the
/// new document in full.
#[async_trait]
pub trait KeySlot: Send + Sync {
    /// Read the stored PEM, or `None` if nothing has been written yet.
    async fn read(&self) -> Result<Option<Zeroizing<String>>, IssuerError>;

    /// Replace the stored PEM.
    async fn write(&self, pem: &str) -> Result<(), IssuerError>;

    /// Human readable location, used in logs.
    fn describe(&self) -> String;
}
