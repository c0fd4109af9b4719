use std::path::Path;

use anyhow::Result;

/// Outcome of a create-container request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerCreation {
    Created,
    AlreadyExists,
}

/// A blob storage account as seen by one run.
///
/// Implementations attempt every operation exactly once; callers decide
/// whether a failure is fatal or merely recorded.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Get the unique identifier for this store (for logs/errors)
    fn store_name(&self) -> String;

    /// Read a whole blob as UTF-8 text
    async fn read_blob_text(&self, container: &str, blob: &str) -> Result<String>;

    /// Check whether a container exists
    async fn container_exists(&self, container: &str) -> Result<bool>;

    /// Create a container
    async fn create_container(&self, container: &str) -> Result<ContainerCreation>;

    /// Upload a local file to `container/key`, returning the bytes sent
    async fn put_file(&self, container: &str, key: &str, path: &Path) -> Result<u64>;
}

/// Opens [`BlobStore`] handles for one storage account, first anonymously to
/// fetch the token, then authenticated with it.
pub trait StoreConnector {
    fn anonymous(&self) -> Result<Box<dyn BlobStore>>;
    fn with_token(&self, token: &str) -> Result<Box<dyn BlobStore>>;
}
