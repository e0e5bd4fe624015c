//! Object storage collaborator: raw document bytes keyed by storage path.
//!
//! The pipeline only ever needs `fetch`, `put`, and `delete`; everything
//! else about the backing store is out of scope. The default backend is a
//! local directory, which keeps the tool usable without any cloud account
//! and gives tests a real implementation to run against.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Abstract object store for raw document bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the bytes at `path`. `Ok(None)` means the object is missing,
    /// which the pipeline reports as a source-not-found failure.
    async fn fetch(&self, path: &str) -> Result<Option<Vec<u8>>>;

    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()>;

    async fn delete(&self, path: &str) -> Result<()>;
}

/// Filesystem-backed object store rooted at a configured directory.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn fetch(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full = self.resolve(path);
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read object {}", full.display())),
        }
    }

    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .with_context(|| format!("Failed to write object {}", full.display()))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path);
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete object {}", full.display())),
        }
    }
}
