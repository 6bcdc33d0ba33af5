// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem implementation of the BlobStore trait.
//!
//! Objects live under a configured root directory; the object path maps
//! directly to a relative filesystem path. Writes overwrite in place, so
//! re-writing a deterministic path for a duplicate delivery is safe.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use dataline_core::types::{AdapterType, HealthStatus};
use dataline_core::{BlobStore, DatalineError, PluginAdapter};

/// Blob store rooted at a local directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an object path under the root, rejecting anything that
    /// would escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, DatalineError> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if path.is_empty() || escapes {
            return Err(DatalineError::Internal(format!(
                "invalid blob path: {path}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl PluginAdapter for FsBlobStore {
    fn name(&self) -> &str {
        "fs-blob"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Blob
    }

    async fn health_check(&self) -> Result<HealthStatus, DatalineError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Unhealthy("blob root is not a directory".into())),
            Err(_) => Ok(HealthStatus::Degraded(
                "blob root does not exist yet; it is created on first write".into(),
            )),
        }
    }

    async fn shutdown(&self) -> Result<(), DatalineError> {
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), DatalineError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DatalineError::Storage {
                    source: Box::new(e),
                })?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| DatalineError::Storage {
                source: Box::new(e),
            })
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, DatalineError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DatalineError::NotFound(format!("blob {path}")))
            }
            Err(e) => Err(DatalineError::Storage {
                source: Box::new(e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store
            .put("processed-results/u1/c1/result.json", b"{\"rows\":[]}")
            .await
            .unwrap();
        let bytes = store
            .get("processed-results/u1/c1/result.json")
            .await
            .unwrap();
        assert_eq!(bytes, b"{\"rows\":[]}");
    }

    #[tokio::test]
    async fn put_overwrites_existing_object() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.put("a/b.json", b"first").await.unwrap();
        store.put("a/b.json", b"second").await.unwrap();
        assert_eq!(store.get("a/b.json").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn get_missing_object_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        let err = store.get("nope/missing.json").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        assert!(store.put("../escape.json", b"x").await.is_err());
        assert!(store.get("/etc/passwd").await.is_err());
        assert!(store.put("", b"x").await.is_err());
    }
}
