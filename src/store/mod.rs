//! Credential store for per-session authentication state.
//!
//! Each session owns one opaque credential blob, keyed by session id.
//! The registry only ever saves, loads, deletes and lists blobs; their
//! contents belong to the automation engine.

mod error;
mod local;
mod traits;

pub use error::{StorageError, StorageResult};
pub use local::LocalCredentialStore;
pub use traits::CredentialStore;
