use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

use super::{validate_key, ObjectStore, StoredObject};

/// Sidecar written next to each object.
#[derive(Debug, Serialize, Deserialize)]
struct ObjectMetadata {
    content_type: String,
    size: u64,
}

fn sidecar_path(object_path: &Path) -> PathBuf {
    let mut name = object_path.as_os_str().to_os_string();
    name.push(".meta.json");
    PathBuf::from(name)
}

/// Writes `content` to a temporary sibling and renames it into place, so a
/// reader never observes a partially written file.
async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StorageError> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, content)
        .await
        .map_err(|e| StorageError::WriteObject {
            path: tmp.clone(),
            source: e,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StorageError::WriteObject {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Object store backed by a local directory. Keys map to relative paths.
pub struct FileObjectStore {
    root: PathBuf,
}

impl FileObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    async fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })
    }
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    async fn upload(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            self.ensure_directory(parent).await?;
        }

        let metadata = ObjectMetadata {
            content_type: content_type.to_string(),
            size: content.len() as u64,
        };
        let metadata = serde_json::to_vec(&metadata).map_err(|e| StorageError::Metadata {
            key: key.to_string(),
            source: e,
        })?;

        write_atomic(&path, content).await?;
        write_atomic(&sidecar_path(&path), &metadata).await?;

        log::debug!("Stored object {} ({} bytes)", key, content.len());
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<StoredObject, StorageError> {
        let path = self.object_path(key)?;
        let meta_path = sidecar_path(&path);

        let raw_meta = match tokio::fs::read(&meta_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => {
                return Err(StorageError::ReadObject {
                    path: meta_path,
                    source: e,
                })
            }
        };
        let metadata: ObjectMetadata =
            serde_json::from_slice(&raw_meta).map_err(|e| StorageError::Metadata {
                key: key.to_string(),
                source: e,
            })?;

        let content = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(StorageError::ReadObject { path, source: e }),
        };

        Ok(StoredObject {
            size: content.len() as u64,
            content,
            content_type: metadata.content_type,
        })
    }
}
