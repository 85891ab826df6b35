// Blobstore Port
// Handle to an external content store (package store, shared bits cache)

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Key of a blob inside a store (app GUID for packages, sha1 for cached bits)
pub type BlobstoreKey = String;

#[async_trait]
pub trait Blobstore: Send + Sync {
    /// Human-readable store name, for logs
    fn name(&self) -> &str;

    /// Check whether a blob exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Copy a local file into the store under `key`
    ///
    /// # Errors
    /// - AppError::Io if the source cannot be read
    /// - AppError::Blobstore if the store rejects the write
    async fn upload(&self, source_path: &Path, key: &str) -> Result<()>;

    /// Copy a blob to a local file
    ///
    /// # Errors
    /// - AppError::NotFound if `key` is absent
    async fn download(&self, key: &str, destination_path: &Path) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Blobstore kept in a HashMap
    pub struct InMemoryBlobstore {
        name: String,
        blobs: Mutex<HashMap<BlobstoreKey, Vec<u8>>>,
        read_only: bool,
    }

    impl InMemoryBlobstore {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                blobs: Mutex::new(HashMap::new()),
                read_only: false,
            }
        }

        /// Store that rejects every upload
        pub fn read_only(name: impl Into<String>) -> Self {
            Self {
                read_only: true,
                ..Self::new(name)
            }
        }

        pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
            self.blobs.lock().unwrap().insert(key.into(), bytes.into());
        }

        pub fn len(&self) -> usize {
            self.blobs.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl Blobstore for InMemoryBlobstore {
        fn name(&self) -> &str {
            &self.name
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            Ok(self.blobs.lock().unwrap().contains_key(key))
        }

        async fn upload(&self, source_path: &Path, key: &str) -> Result<()> {
            if self.read_only {
                return Err(AppError::Blobstore(format!("{} is read-only", self.name)));
            }
            let bytes = tokio::fs::read(source_path).await?;
            self.insert(key, bytes);
            Ok(())
        }

        async fn download(&self, key: &str, destination_path: &Path) -> Result<()> {
            let bytes = self
                .blobs
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("blob {} in {}", key, self.name)))?;
            tokio::fs::write(destination_path, bytes).await?;
            Ok(())
        }
    }
}
