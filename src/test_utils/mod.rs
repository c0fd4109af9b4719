//! Test utilities for the disk uploader
//!
//! This module provides in-memory fakes for the storage account and the
//! disk enumerator, plus helpers for building file trees.

#![cfg(test)]

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tempfile::{NamedTempFile, TempDir};

use crate::cloud::store::{BlobStore, ContainerCreation, StoreConnector};
use crate::disks::VolumeSource;
use crate::models::Volume;

/// Creates a temporary file with the given content
pub fn create_temp_file(content: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    use std::io::Write;
    file.write_all(content)?;
    file.flush()?;
    Ok(file)
}

/// Creates a test file structure in a temporary directory:
///
/// ```text
/// file1.txt
/// File2.LOG
/// dir1/file3.txt
/// dir1/subdir1/file4.txt
/// dir2/
/// .hidden/secret.txt
/// ```
pub fn create_test_file_structure() -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    let base_path = temp_dir.path();

    fs::create_dir_all(base_path.join("dir1/subdir1"))?;
    fs::create_dir_all(base_path.join("dir2"))?;
    fs::create_dir_all(base_path.join(".hidden"))?;

    fs::write(base_path.join("file1.txt"), b"Test content 1")?;
    fs::write(base_path.join("File2.LOG"), b"Test log content")?;
    fs::write(base_path.join("dir1/file3.txt"), b"Test content 3")?;
    fs::write(base_path.join("dir1/subdir1/file4.txt"), b"Test content 4")?;
    fs::write(base_path.join(".hidden/secret.txt"), b"hidden")?;

    Ok(temp_dir)
}

/// Volume whose identifier is the string form of `path`
pub fn volume_at(path: &Path) -> Volume {
    Volume::fixed(&path.to_string_lossy(), 1024 * 1024 * 1024)
}

/// Number of entries directly inside `dir`
pub fn dir_entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|rd| rd.count()).unwrap_or(0)
}

#[derive(Default)]
struct StoreState {
    blobs: BTreeMap<(String, String), Vec<u8>>,
    containers: HashSet<String>,
    failing_key_fragments: Vec<String>,
    fail_container_ops: bool,
    create_calls: usize,
}

/// In-memory blob store. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob directly, creating its container
    pub fn insert_blob(&self, container: &str, key: &str, content: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.containers.insert(container.to_string());
        state
            .blobs
            .insert((container.to_string(), key.to_string()), content.to_vec());
    }

    pub fn blob(&self, container: &str, key: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .blobs
            .get(&(container.to_string(), key.to_string()))
            .cloned()
    }

    /// Sorted keys stored in `container`
    pub fn keys(&self, container: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .blobs
            .keys()
            .filter(|(c, _)| c == container)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn has_container(&self, container: &str) -> bool {
        self.state.lock().unwrap().containers.contains(container)
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    /// Make every upload whose key contains `fragment` fail
    pub fn fail_uploads_containing(&self, fragment: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_key_fragments
            .push(fragment.to_string());
    }

    /// Make container lookups and creation fail
    pub fn fail_container_ops(&self) {
        self.state.lock().unwrap().fail_container_ops = true;
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    fn store_name(&self) -> String {
        "memory".to_string()
    }

    async fn read_blob_text(&self, container: &str, blob: &str) -> Result<String> {
        let content = self
            .blob(container, blob)
            .ok_or_else(|| anyhow!("Get Blob returned 404 Not Found (BlobNotFound)"))?;
        Ok(String::from_utf8(content)?)
    }

    async fn container_exists(&self, container: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        if state.fail_container_ops {
            return Err(anyhow!(
                "Get Container Properties returned 403 Forbidden (AuthorizationFailure)"
            ));
        }
        Ok(state.containers.contains(container))
    }

    async fn create_container(&self, container: &str) -> Result<ContainerCreation> {
        let mut state = self.state.lock().unwrap();
        if state.fail_container_ops {
            return Err(anyhow!("Create Container returned 403 Forbidden (AuthorizationFailure)"));
        }
        state.create_calls += 1;
        if state.containers.insert(container.to_string()) {
            Ok(ContainerCreation::Created)
        } else {
            Ok(ContainerCreation::AlreadyExists)
        }
    }

    async fn put_file(&self, container: &str, key: &str, path: &Path) -> Result<u64> {
        let content = tokio::fs::read(path).await?;

        let mut state = self.state.lock().unwrap();
        if !state.containers.contains(container) {
            return Err(anyhow!("Put Blob returned 404 Not Found (ContainerNotFound)"));
        }
        if state.failing_key_fragments.iter().any(|f| key.contains(f.as_str())) {
            return Err(anyhow!(
                "Put Blob returned 500 Internal Server Error for https://acct.blob.core.windows.net/{}/{}?sv=2021-08-06&sig=testsignature",
                container,
                key
            ));
        }

        let size = content.len() as u64;
        state
            .blobs
            .insert((container.to_string(), key.to_string()), content);
        Ok(size)
    }
}

/// Connector handing out clones of one [`MemoryBlobStore`].
#[derive(Clone, Default)]
pub struct MemoryConnector {
    pub store: MemoryBlobStore,
    tokens: Arc<Mutex<Vec<String>>>,
}

impl MemoryConnector {
    pub fn new(store: MemoryBlobStore) -> Self {
        MemoryConnector {
            store,
            tokens: Arc::default(),
        }
    }

    /// Tokens passed to `with_token`, in order
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

impl StoreConnector for MemoryConnector {
    fn anonymous(&self) -> Result<Box<dyn BlobStore>> {
        Ok(Box::new(self.store.clone()))
    }

    fn with_token(&self, token: &str) -> Result<Box<dyn BlobStore>> {
        self.tokens.lock().unwrap().push(token.to_string());
        Ok(Box::new(self.store.clone()))
    }
}

/// Fixed list of volumes, or a failing enumerator
pub struct StaticVolumes {
    volumes: Vec<Volume>,
    fail: bool,
}

impl StaticVolumes {
    pub fn new(volumes: Vec<Volume>) -> Self {
        StaticVolumes { volumes, fail: false }
    }

    pub fn failing() -> Self {
        StaticVolumes {
            volumes: Vec::new(),
            fail: true,
        }
    }
}

impl VolumeSource for StaticVolumes {
    fn fixed_volumes(&self) -> Result<Vec<Volume>> {
        if self.fail {
            return Err(anyhow!("volume query failed"));
        }
        Ok(self.volumes.clone())
    }
}

