//! Remote record store for upload records.
//!
//! Records are appended under `tcc-uploads/{uid}` with a key generated by the
//! store. Nothing here reads, updates or deletes stored records.

mod firebase;
mod memory;

pub use firebase::FirebaseRecordStore;
pub use memory::MemoryRecordStore;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::models::{RecordKey, UploadRecord};

/// Root collection holding every user's upload records.
pub const UPLOADS_ROOT: &str = "tcc-uploads";

/// Record store errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The store's access rules refused the write.
    #[error("Permission denied")]
    PermissionDenied,

    /// The store refused the write with its own message.
    #[error("{0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response from the database: {0}")]
    InvalidResponse(String),
}

/// Append-only access to the per-user upload collection.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append one record under `tcc-uploads/{owner_uid}` and return its generated key.
    ///
    /// `id_token` authenticates the write as the owner.
    async fn append(
        &self,
        owner_uid: &str,
        id_token: &SecretString,
        record: &UploadRecord,
    ) -> Result<RecordKey, StoreError>;

    /// Short backend name for readiness reporting.
    fn backend(&self) -> &'static str;
}

/// Path of a user's upload collection relative to the database root.
pub fn collection_path(owner_uid: &str) -> String {
    format!("{}/{}", UPLOADS_ROOT, owner_uid)
}
