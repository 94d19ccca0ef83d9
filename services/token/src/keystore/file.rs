//! File-backed key slot.
//!
//! Writes go to a sibling temporary file which is synced and then renamed
//! over the target. Rename within one directory is atomic, so readers never
//! see a partially written key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use zeroize::Zeroizing;

use super::slot::KeySlot;
use crate::error::IssuerError;

/// Default key file name, relative to the working directory.
pub const DEFAULT_KEY_PATH: &str = "private_key.pem";

/// Key slot stored in a single PEM file.
#[derive(Debug, Clone)]
pub struct FileKeySlot {
    path: PathBuf,
}

impl FileKeySlot {
    /// Create a slot for the given file path. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the key file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }

    async fn write_temp(&self, temp: &Path, pem: &str) -> Result<(), IssuerError> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(temp).await?;
        file.write_all(pem.as_bytes()).await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl KeySlot for FileKeySlot {
    async fn read(&self) -> Result<Option<Zeroizing<String>>, IssuerError> {
        match fs::read_to_string(&self.path).await {
            Ok(pem) => Ok(Some(Zeroizing::new(pem))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IssuerError::key_storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write(&self, pem: &str) -> Result<(), IssuerError> {
        let temp = self.temp_path();

        if let Err(e) = self.write_temp(&temp, pem).await {
            let _ = fs::remove_file(&temp).await;
            return Err(IssuerError::key_storage(format!(
                "failed to write {}: {e}",
                temp.display()
            )));
        }

        if let Err(e) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(IssuerError::key_storage(format!(
                "failed to replace {}: {e}",
                self.path.display()
            )));
        }

        debug!(path = %self.path.display(), "Key file replaced");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
