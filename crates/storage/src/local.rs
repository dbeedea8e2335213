use crate::backend::StorageBackend;
use crate::models::{AccessUrl, BackendKind, ObjectMetadata, StoredObject, UploadDescriptor};
use crate::naming::{compose_reference, validate_reference};
use crate::StorageError;
use attic_filesystem::FileSystem;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWriteExt, BufWriter};

/// Unreserved URL characters (RFC 3986) pass through; everything else in a
/// segment is escaped
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Local filesystem storage backend
pub struct LocalBackend {
    root: PathBuf,
    url_prefix: String,
}

impl LocalBackend {
    /// Creates a backend rooted at `root`, creating the directory if absent.
    /// Download URLs are `{url_prefix}/{reference}`.
    pub async fn new(root: impl AsRef<Path>, url_prefix: &str) -> Result<Self, StorageError> {
        let root = root.as_ref();
        let root = FileSystem::ensure_directory(root, "Upload root")
            .await
            .map_err(|e| StorageError::unavailable(&root.display().to_string(), e))?;

        Ok(Self {
            root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        })
    }

    /// Maps a reference to its path under the root
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, StorageError> {
        validate_reference(reference)?;
        Ok(self.root.join(reference))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalBackend {
    async fn store(&self, mut upload: UploadDescriptor) -> Result<StoredObject, StorageError> {
        let reference = compose_reference(&upload.folder, &upload.filename)?;
        let path = self.root.join(&reference);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::unavailable(&reference, e))?;
        }

        // The token makes the path fresh; create_new guards the invariant anyway
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| StorageError::unavailable(&reference, e))?;

        match write_stream(file, &mut upload.reader).await {
            Ok(size_bytes) => {
                tracing::info!("Stored {} ({} bytes) on local disk", reference, size_bytes);
                Ok(StoredObject { reference, size_bytes })
            }
            Err(e) => {
                remove_partial(&path).await;
                Err(StorageError::unavailable(&reference, e))
            }
        }
    }

    async fn delete(&self, reference: &str) -> Result<bool, StorageError> {
        let path = self.resolve(reference)?;

        // Directories and other non-files are never objects
        match fs::symlink_metadata(&path).await {
            Ok(metadata) if !metadata.is_file() => {
                tracing::debug!("Delete of {} skipped: not a stored object", reference);
                return Ok(false);
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Delete of {} skipped: not found", reference);
                return Ok(false);
            }
            Err(e) => return Err(StorageError::unavailable(reference, e)),
        }

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("Deleted {} from local disk", reference);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Delete of {} skipped: not found", reference);
                Ok(false)
            }
            Err(e) => Err(StorageError::unavailable(reference, e)),
        }
    }

    async fn download_url(&self, reference: &str, _expires_in_secs: u64) -> Result<AccessUrl, StorageError> {
        validate_reference(reference)?;

        let path = reference
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");

        Ok(AccessUrl {
            url: format!("{}/{}", self.url_prefix, path),
            expires_at: None,
        })
    }

    async fn upload_url(
        &self,
        _reference: &str,
        _content_type: &str,
        _expires_in_secs: u64,
    ) -> Result<AccessUrl, StorageError> {
        Err(StorageError::Unsupported("local", "direct upload URLs"))
    }

    async fn stat(&self, reference: &str) -> Result<ObjectMetadata, StorageError> {
        let path = self.resolve(reference)?;

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(StorageError::NotFound(reference.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(reference.to_string()))
            }
            Err(e) => return Err(StorageError::unavailable(reference, e)),
        };

        Ok(ObjectMetadata {
            reference: reference.to_string(),
            size_bytes: metadata.len(),
            content_type: mime_guess::from_path(&path).first().map(|m| m.to_string()),
        })
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn local_root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

/// Copies the stream into `file` and syncs it to disk, returning the byte count
async fn write_stream(file: File, reader: &mut (dyn AsyncRead + Send + Unpin)) -> io::Result<u64> {
    let mut writer = BufWriter::new(file);
    let size = tokio::io::copy(reader, &mut writer).await?;
    writer.flush().await?;
    writer.get_ref().sync_all().await?;
    Ok(size)
}

async fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove partial upload {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    async fn backend(dir: &tempfile::TempDir) -> LocalBackend {
        LocalBackend::new(dir.path().join("uploads"), "/files").await.unwrap()
    }

    /// Yields one chunk, then fails
    struct FailingReader {
        sent: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away")));
            }
            self.sent = true;
            buf.put_slice(b"partial");
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_new_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        assert!(dir.path().join("uploads").is_dir());
        assert_eq!(storage.local_root(), Some(dir.path().join("uploads").as_path()));
        assert_eq!(storage.kind(), BackendKind::Local);
        assert!(!storage.is_remote());
    }

    #[tokio::test]
    async fn test_store_report() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        let stored = storage
            .store(UploadDescriptor::from_bytes(&b"0123456789"[..], "report.pdf", "tasks/42"))
            .await
            .unwrap();

        assert_eq!(stored.size_bytes, 10);

        let name = stored.reference.strip_prefix("tasks/42/").unwrap();
        let (token, filename) = name.split_once('_').unwrap();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(filename, "report.pdf");

        let on_disk = std::fs::read(storage.resolve(&stored.reference).unwrap()).unwrap();
        assert_eq!(on_disk, b"0123456789");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        let stored = storage
            .store(UploadDescriptor::from_bytes(&b"0123456789"[..], "report.pdf", "tasks/42"))
            .await
            .unwrap();
        let path = storage.resolve(&stored.reference).unwrap();

        assert!(storage.delete(&stored.reference).await.unwrap());
        assert!(!storage.delete(&stored.reference).await.unwrap());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_delete_never_stored() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        assert!(!storage.delete("tasks/1/ffffffffffffffffffffffffffffffff_ghost.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_identical_uploads_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        let first = storage
            .store(UploadDescriptor::from_bytes(&b"first"[..], "notes.txt", "tasks/3"))
            .await
            .unwrap();
        let second = storage
            .store(UploadDescriptor::from_bytes(&b"second"[..], "notes.txt", "tasks/3"))
            .await
            .unwrap();

        assert_ne!(first.reference, second.reference);

        assert!(storage.delete(&first.reference).await.unwrap());
        let remaining = std::fs::read(storage.resolve(&second.reference).unwrap()).unwrap();
        assert_eq!(remaining, b"second");
    }

    #[tokio::test]
    async fn test_traversal_filename_stays_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        let stored = storage
            .store(UploadDescriptor::from_bytes(&b"x"[..], "../../escape.txt", "tasks/1"))
            .await
            .unwrap();

        assert!(stored.reference.starts_with("tasks/1/"));
        assert!(stored.reference.ends_with("_escape.txt"));
        assert!(storage.resolve(&stored.reference).unwrap().starts_with(dir.path().join("uploads")));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_traversal_folder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        let err = storage
            .store(UploadDescriptor::from_bytes(&b"x"[..], "a.txt", "../outside"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::InvalidInput(_)));
        assert!(!dir.path().join("outside").exists());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        let err = storage
            .store(UploadDescriptor::new(FailingReader { sent: false }, "big.bin", "tasks/9"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::StorageUnavailable(..)));
        assert!(err.is_transient());

        let folder = dir.path().join("uploads").join("tasks").join("9");
        assert_eq!(std::fs::read_dir(folder).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_download_url_has_no_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalBackend::new(dir.path(), "/files/").await.unwrap();

        let short = storage.download_url("tasks/42/abc_report.pdf", 1).await.unwrap();
        let long = storage.download_url("tasks/42/abc_report.pdf", 3600).await.unwrap();

        assert_eq!(short.url, "/files/tasks/42/abc_report.pdf");
        assert_eq!(short, long);
        assert_eq!(short.expires_at, None);

        assert!(storage.download_url("../secret", 60).await.is_err());
    }

    #[tokio::test]
    async fn test_download_url_escapes_segments() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        let access = storage
            .download_url("tasks/q?1 #2/caf\u{e9}~/abc_report.pdf", 60)
            .await
            .unwrap();
        assert_eq!(access.url, "/files/tasks/q%3F1%20%232/caf%C3%A9~/abc_report.pdf");
    }

    #[tokio::test]
    async fn test_delete_folder_is_not_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        let stored = storage
            .store(UploadDescriptor::from_bytes(&b"keep"[..], "a.txt", "tasks/1"))
            .await
            .unwrap();

        assert!(!storage.delete("tasks/1").await.unwrap());
        assert!(!storage.delete("tasks").await.unwrap());
        assert!(matches!(storage.stat("tasks/1").await, Err(StorageError::NotFound(_))));

        let kept = std::fs::read(storage.resolve(&stored.reference).unwrap()).unwrap();
        assert_eq!(kept, b"keep");
    }

    #[tokio::test]
    async fn test_upload_url_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        let err = storage
            .upload_url("tasks/1/abc_a.txt", "text/plain", 60)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unsupported("local", _)));
    }

    #[tokio::test]
    async fn test_stat() {
        let dir = tempfile::tempdir().unwrap();
        let storage = backend(&dir).await;

        let stored = storage
            .store(
                UploadDescriptor::from_bytes(&b"%PDF-1.7"[..], "report.pdf", "tasks/5")
                    .with_content_type("application/pdf"),
            )
            .await
            .unwrap();

        let meta = storage.stat(&stored.reference).await.unwrap();
        assert_eq!(meta.size_bytes, 8);
        assert_eq!(meta.content_type.as_deref(), Some("application/pdf"));

        storage.delete(&stored.reference).await.unwrap();
        assert!(matches!(
            storage.stat(&stored.reference).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(storage.stat("tasks").await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_stores() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(backend(&dir).await);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let storage = Arc::clone(&storage);
                tokio::spawn(async move {
                    storage
                        .store(UploadDescriptor::from_bytes(vec![i as u8; 64], "same.bin", "tasks/8"))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut references = std::collections::HashSet::new();
        for handle in handles {
            let stored = handle.await.unwrap();
            assert_eq!(stored.size_bytes, 64);
            references.insert(stored.reference);
        }
        assert_eq!(references.len(), 16);
    }
}
