//! Signing key lifecycle: load-or-create, rotate, persist.
//!
//! The store owns exactly one key slot. A read/write gate orders slot
//! replacement against in-flight signing: an [`ActiveKey`] holds the shared
//! side until it is dropped, and replacing the persisted key takes the
//! exclusive side. Key generation happens before the gate is taken.

pub mod file;
pub mod key;
pub mod memory;
pub mod slot;

use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

use crate::error::IssuerError;

pub use file::FileKeySlot;
pub use key::{SigningKey, DEFAULT_KEY_BITS};
pub use memory::MemoryKeySlot;
pub use slot::KeySlot;

/// The key in effect for one issuance.
///
/// While this value is alive no other request can replace the persisted key,
/// so the token and JWK built from it always describe the current key.
pub struct ActiveKey<'a> {
    key: SigningKey,
    created: bool,
    _gate: RwLockReadGuard<'a, ()>,
}

impl ActiveKey<'_> {
    /// Whether this call generated and persisted the key (first use or rotation).
    #[must_use]
    pub const fn created(&self) -> bool {
        self.created
    }

    /// The signing key.
    #[must_use]
    pub const fn key(&self) -> &SigningKey {
        &self.key
    }
}

impl Deref for ActiveKey<'_> {
    type Target = SigningKey;

    fn deref(&self) -> &SigningKey {
        &self.key
    }
}

/// Owner of the persisted signing key.
pub struct KeyStore {
    slot: Arc<dyn KeySlot>,
    key_bits: usize,
    gate: RwLock<()>,
}

impl KeyStore {
    /// Create a store over the given slot, generating 2048-bit keys.
    #[must_use]
    pub fn new(slot: Arc<dyn KeySlot>) -> Self {
        Self {
            slot,
            key_bits: DEFAULT_KEY_BITS,
            gate: RwLock::new(()),
        }
    }

    /// Set the modulus size used for newly generated keys.
    #[must_use]
    pub const fn with_key_bits(mut self, bits: usize) -> Self {
        self.key_bits = bits;
        self
    }

    /// Return the persisted key, creating and persisting one if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns a key storage error if the slot cannot be read or written, or
    /// a crypto error if key generation fails.
    pub async fn load_or_create(&self) -> Result<ActiveKey<'_>, IssuerError> {
        {
            let gate = self.gate.read().await;
            if let Some(key) = self.load().await? {
                return Ok(ActiveKey {
                    key,
                    created: false,
                    _gate: gate,
                });
            }
        }

        let generated = self.generate().await?;
        let gate = self.gate.write().await;

        // A concurrent first request may have filled the slot meanwhile.
        if let Some(key) = self.load().await? {
            debug!(slot = %self.slot.describe(), "Key created concurrently, discarding ours");
            return Ok(ActiveKey {
                key,
                created: false,
                _gate: gate.downgrade(),
            });
        }

        self.persist(&generated).await?;
        info!(slot = %self.slot.describe(), bits = generated.bits(), "Signing key created");

        Ok(ActiveKey {
            key: generated,
            created: true,
            _gate: gate.downgrade(),
        })
    }

    /// Generate a new key and persist it over the current one.
    ///
    /// # Errors
    ///
    /// Returns a key storage error if the slot cannot be written, or a crypto
    /// error if key generation fails.
    pub async fn rotate(&self) -> Result<ActiveKey<'_>, IssuerError> {
        let generated = self.generate().await?;
        let gate = self.gate.write().await;

        self.persist(&generated).await?;
        info!(slot = %self.slot.describe(), bits = generated.bits(), "Signing key rotated");

        Ok(ActiveKey {
            key: generated,
            created: true,
            _gate: gate.downgrade(),
        })
    }

    async fn load(&self) -> Result<Option<SigningKey>, IssuerError> {
        self.slot
            .read()
            .await?
            .map(|pem| SigningKey::from_pem(&pem))
            .transpose()
    }

    async fn generate(&self) -> Result<SigningKey, IssuerError> {
        let bits = self.key_bits;
        tokio::task::spawn_blocking(move || SigningKey::generate(bits))
            .await
            .map_err(|e| IssuerError::crypto(format!("key generation task failed: {e}")))?
    }

    async fn persist(&self, key: &SigningKey) -> Result<(), IssuerError> {
        let pem = key.to_pem()?;
        self.slot.write(&pem).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> (Arc<MemoryKeySlot>, KeyStore) {
        let slot = Arc::new(MemoryKeySlot::new());
        let store = KeyStore::new(slot.clone());
        (slot, store)
    }

    #[tokio::test]
    async fn test_first_load_creates_and_persists() {
        let (slot, store) = memory_store();

        let active = store.load_or_create().await.unwrap();
        assert!(active.created());
        let created = active.key().clone();
        drop(active);

        let pem = slot.read().await.unwrap().unwrap();
        assert_eq!(SigningKey::from_pem(&pem).unwrap(), created);
    }

    #[tokio::test]
    async fn test_second_load_reuses_key() {
        let (_slot, store) = memory_store();

        let first = store.load_or_create().await.unwrap().key().clone();
        let second = store.load_or_create().await.unwrap();

        assert!(!second.created());
        assert_eq!(second.key(), &first);
    }

    #[tokio::test]
    async fn test_rotate_replaces_key() {
        let (_slot, store) = memory_store();

        let before = store.load_or_create().await.unwrap().key().clone();
        let rotated = store.rotate().await.unwrap();
        assert!(rotated.created());
        assert_ne!(rotated.modulus_be(), before.modulus_be());
        let rotated = rotated.key().clone();

        let after = store.load_or_create().await.unwrap();
        assert!(!after.created());
        assert_eq!(after.key(), &rotated);
    }

    #[tokio::test]
    async fn test_existing_pem_is_loaded() {
        let key = SigningKey::generate(DEFAULT_KEY_BITS).unwrap();
        let slot = Arc::new(MemoryKeySlot::with_pem(key.to_pem().unwrap().as_str()));
        let store = KeyStore::new(slot);

        let active = store.load_or_create().await.unwrap();
        assert!(!active.created());
        assert_eq!(active.key(), &key);
    }

    #[tokio::test]
    async fn test_corrupt_slot_is_a_storage_error() {
        let store = KeyStore::new(Arc::new(MemoryKeySlot::with_pem("garbage")));

        let err = store.load_or_create().await.err().unwrap();
        assert_eq!(err.code(), "KEY_STORAGE");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_agrees_on_one_key() {
        let (_slot, store) = memory_store();
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let active = store.load_or_create().await.unwrap();
                (active.created(), active.modulus_be())
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        let created = results.iter().filter(|(created, _)| *created).count();
        assert_eq!(created, 1);
        assert!(results.iter().all(|(_, n)| *n == results[0].1));
    }
}
