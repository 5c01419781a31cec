//! Credential store trait definition.

use async_trait::async_trait;

use super::StorageResult;

/// Durable storage for per-session credential blobs.
///
/// Implementations persist one opaque blob per session id, whether on local
/// disk or in a remote store. Deleting a session removes its blob; listing
/// the store at boot drives session recovery.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Check whether a blob exists for the session id.
    async fn exists(&self, session_id: &str) -> StorageResult<bool>;

    /// Persist the credential blob for a session, replacing any previous one.
    async fn save(&self, session_id: &str, data: &[u8]) -> StorageResult<()>;

    /// Load the credential blob for a session.
    async fn load(&self, session_id: &str) -> StorageResult<Vec<u8>>;

    /// Delete the credential blob for a session.
    ///
    /// Deleting a session that has no blob is not an error.
    async fn delete(&self, session_id: &str) -> StorageResult<()>;

    /// List the session ids that have a persisted blob.
    async fn list(&self) -> StorageResult<Vec<String>>;
}
