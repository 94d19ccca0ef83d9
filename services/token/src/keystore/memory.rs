//! In-process key slot for tests and embedding.

use async_trait::async_trait;
use tokio::sync::RwLock;
use zeroize::Zeroizing;

use super::slot::KeySlot;
use crate::error::IssuerError;

/// Key slot backed by process memory. Contents are lost on exit.
#[derive(Default)]
pub struct MemoryKeySlot {
    pem: RwLock<Option<Zeroizing<String>>>,
}

impl MemoryKeySlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot that already holds a PEM document.
    #[must_use]
    pub fn with_pem(pem: impl Into<String>) -> Self {
        Self {
            pem: RwLock::new(Some(Zeroizing::new(pem.into()))),
        }
    }
}

#[async_trait]
impl KeySlot for MemoryKeySlot {
    async fn read(&self) -> Result<Option<Zeroizing<String>>, IssuerError> {
        Ok(self.pem.read().await.clone())
    }

    async fn write(&self, pem: &str) -> Result<(), IssuerError> {
        *self.pem.write().await = Some(Zeroizing::new(pem.to_owned()));
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
