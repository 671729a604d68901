//! Artifact storage for downloaded pages and rendered PDFs
//! Uses Apache Arrow object_store crate

use object_store::{ObjectStore, path::Path as StoragePath};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StorageConfig, StorageProvider};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Artifact store wrapping object_store
///
/// Keys are laid out as `{site}/{comicid}/{chapter}/{page}` for pages and
/// `{site}/{comicid}/task-{id}.pdf` for rendered documents.
#[derive(Clone)]
pub struct ArtifactStore {
    store: Arc<dyn ObjectStore>,
}

impl ArtifactStore {
    /// Create a store with any object_store backend
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Create in-memory storage for testing/development
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(object_store::memory::InMemory::new()),
        }
    }

    /// Create local-filesystem storage rooted at `root` (created if missing)
    pub fn local(root: &std::path::Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let store = object_store::local::LocalFileSystem::new_with_prefix(root)?;
        Ok(Self {
            store: Arc::new(store),
        })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        match config.provider {
            StorageProvider::Memory => Ok(Self::in_memory()),
            StorageProvider::Local => Self::local(&config.root),
        }
    }

    /// Key for one downloaded chapter page. The page extension comes from
    /// the source url when it carries one, defaulting to jpg.
    pub fn page_key(site: &str, comicid: &str, chapter_number: u32, index: usize, url: &str) -> String {
        let ext = url
            .rsplit('.')
            .next()
            .filter(|ext| ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("jpg");
        format!("{site}/{comicid}/{chapter_number}/{:04}.{ext}", index + 1)
    }

    /// Key for one chapter's rendered PDF.
    pub fn pdf_key(site: &str, comicid: &str, chapter_number: u32, task_id: u64) -> String {
        format!("{site}/{comicid}/{chapter_number}/task-{task_id}.pdf")
    }

    /// Write bytes under a key
    pub async fn put(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let path = StoragePath::from(key);
        let size = data.len();

        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        tracing::debug!(key, size, "Stored artifact");
        Ok(())
    }

    /// Read bytes back from a key
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = StoragePath::from(key);

        let result = match self.store.get(&path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let bytes = result.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = StoragePath::from(key);

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
