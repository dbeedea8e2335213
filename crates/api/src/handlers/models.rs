use attic_storage::SharedStorage;
use std::path::PathBuf;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub(super) storage: SharedStorage,
    /// Root of the local backend; `None` when objects live in a remote store
    pub(super) files_root: Option<Arc<PathBuf>>,
    pub(super) streaming_threshold_bytes: u64,
}
