//! Local filesystem credential store.

use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{CredentialStore, StorageError, StorageResult};

/// Filename of the credential blob inside a session directory.
const BLOB_NAME: &str = "credentials.json";

/// Credential store backed by a local directory.
///
/// Layout: one directory per session id under the root, holding the
/// credential blob plus whatever working files the engine keeps alongside it.
#[derive(Debug, Clone)]
pub struct LocalCredentialStore {
    root: PathBuf,
}

impl LocalCredentialStore {
    /// Create a new store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a session's credential state.
    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    fn blob_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(BLOB_NAME)
    }

    fn check_key(session_id: &str) -> StorageResult<()> {
        if session_id.is_empty()
            || session_id.contains(['/', '\\'])
            || session_id.starts_with('.')
        {
            return Err(StorageError::InvalidKey(session_id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for LocalCredentialStore {
    async fn exists(&self, session_id: &str) -> StorageResult<bool> {
        Self::check_key(session_id)?;
        Ok(self.blob_path(session_id).exists())
    }

    async fn save(&self, session_id: &str, data: &[u8]) -> StorageResult<()> {
        Self::check_key(session_id)?;
        let dir = self.session_dir(session_id);
        fs::create_dir_all(&dir).await?;
        let path = self.blob_path(session_id);
        fs::write(&path, data).await?;
        debug!("Saved {} credential bytes to {}", data.len(), path.display());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> StorageResult<Vec<u8>> {
        Self::check_key(session_id)?;
        let path = self.blob_path(session_id);
        fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(session_id.to_string())
            } else {
                StorageError::Io(e)
            }
        })
    }

    async fn delete(&self, session_id: &str) -> StorageResult<()> {
        Self::check_key(session_id)?;
        let dir = self.session_dir(session_id);
        if !dir.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&dir).await?;
        debug!("Deleted credentials for session {}", session_id);
        Ok(())
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            // Only directories that actually hold a blob count as sessions.
            if entry.path().join(BLOB_NAME).exists() {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalCredentialStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalCredentialStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let (_dir, store) = store();
        store.save("alpha", b"{\"wa\":1}").await.unwrap();
        assert!(store.exists("alpha").await.unwrap());
        assert_eq!(store.load("alpha").await.unwrap(), b"{\"wa\":1}");
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.load("ghost").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, store) = store();
        store.save("alpha", b"x").await.unwrap();
        store.delete("alpha").await.unwrap();
        assert!(!store.exists("alpha").await.unwrap());
        // Second delete of the same id succeeds too.
        store.delete("alpha").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_only_counts_sessions_with_blobs() {
        let (dir, store) = store();
        store.save("beta", b"x").await.unwrap();
        store.save("alpha", b"y").await.unwrap();
        // A stray directory without a blob is ignored.
        std::fs::create_dir(dir.path().join("scratch")).unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_rejects_path_traversal_keys() {
        let (_dir, store) = store();
        for key in ["", "../evil", "a/b", ".hidden"] {
            assert!(matches!(
                store.save(key, b"x").await.unwrap_err(),
                StorageError::InvalidKey(_)
            ));
        }
    }
}
