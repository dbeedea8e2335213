use crate::models::{AccessUrl, BackendKind, ObjectMetadata, StoredObject, UploadDescriptor};
use crate::StorageError;
use std::path::Path;
use std::sync::Arc;

/// Shared handle to the backend chosen at startup
pub type SharedStorage = Arc<dyn StorageBackend>;

/// Storage backend trait for attachment storage.
///
/// Implementations hold only immutable configuration and are safe to share
/// between concurrent request handlers.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persists the upload under a freshly minted reference.
    ///
    /// Returns only once every byte is durably written. On failure no
    /// retrievable partial object is left behind.
    async fn store(&self, upload: UploadDescriptor) -> Result<StoredObject, StorageError>;

    /// Deletes an object. Returns `Ok(false)` if it did not exist.
    async fn delete(&self, reference: &str) -> Result<bool, StorageError>;

    /// Issues a URL to download the object
    async fn download_url(&self, reference: &str, expires_in_secs: u64) -> Result<AccessUrl, StorageError>;

    /// Issues a URL permitting one direct upload of `content_type` to `reference`
    async fn upload_url(
        &self,
        reference: &str,
        content_type: &str,
        expires_in_secs: u64,
    ) -> Result<AccessUrl, StorageError>;

    /// Size and type of a stored object, `NotFound` if absent
    async fn stat(&self, reference: &str) -> Result<ObjectMetadata, StorageError>;

    fn kind(&self) -> BackendKind;

    /// Check if backend is local or remote
    fn is_remote(&self) -> bool {
        self.kind() == BackendKind::Remote
    }

    /// Directory holding stored files, for backends that have one
    fn local_root(&self) -> Option<&Path> {
        None
    }
}
