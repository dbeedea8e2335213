use crate::backend::SharedStorage;
use crate::local::LocalBackend;
use crate::models::BackendKind;
use crate::StorageError;
use attic_config::StorageSettings;
use std::sync::Arc;

impl BackendKind {
    /// Picks the backend for a configuration. Remote only when it is enabled
    /// AND has a bucket; everything else falls back to local disk.
    pub fn select(settings: &StorageSettings) -> BackendKind {
        if settings.wants_remote() {
            BackendKind::Remote
        } else {
            if settings.use_remote {
                tracing::warn!("Remote storage enabled without a bucket name, using local storage");
            }
            BackendKind::Local
        }
    }
}

/// Builds the process-wide storage handle. Called once at startup; the choice
/// is fixed for the lifetime of the process.
pub async fn select_backend(settings: &StorageSettings) -> Result<SharedStorage, StorageError> {
    match BackendKind::select(settings) {
        BackendKind::Local => {
            let backend = LocalBackend::new(&settings.local.root_dir, &settings.local.url_prefix).await?;
            tracing::info!(
                "Initialized local storage backend: root={}",
                settings.local.root_dir
            );
            Ok(Arc::new(backend) as SharedStorage)
        }
        #[cfg(feature = "s3")]
        BackendKind::Remote => {
            let backend = crate::s3::S3Backend::from_settings(&settings.remote).await?;
            Ok(Arc::new(backend) as SharedStorage)
        }
        #[cfg(not(feature = "s3"))]
        BackendKind::Remote => Err(StorageError::ConfigError(
            "Remote storage selected but not compiled. Rebuild with --features s3 to enable S3 support."
                .to_string(),
        )),
    }
}
