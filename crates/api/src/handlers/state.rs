use super::models::AppState;
use attic_storage::SharedStorage;
use std::sync::Arc;

impl AppState {
    pub fn new(storage: SharedStorage, streaming_threshold_mb: u64) -> Self {
        let files_root = storage.local_root().map(|root| Arc::new(root.to_path_buf()));
        Self {
            storage,
            files_root,
            streaming_threshold_bytes: streaming_threshold_mb * 1024 * 1024,
        }
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// True when a file route should be mounted
    pub fn serves_files(&self) -> bool {
        self.files_root.is_some()
    }
}
