use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::Cursor;
use tokio::io::AsyncRead;

pub use attic_config::{DEFAULT_URL_EXPIRY_SECS, MAX_URL_EXPIRY_SECS};

/// Which medium a backend writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Remote => "s3",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input of a store operation.
///
/// `filename` is only used as a display suffix of the generated reference;
/// directory components in it are discarded.
pub struct UploadDescriptor {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub filename: String,
    pub folder: String,
    pub content_type: Option<String>,
}

impl UploadDescriptor {
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        filename: impl Into<String>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            filename: filename.into(),
            folder: folder.into(),
            content_type: None,
        }
    }

    pub fn from_bytes(data: impl Into<Bytes>, filename: impl Into<String>, folder: impl Into<String>) -> Self {
        Self::new(Cursor::new(data.into()), filename, folder)
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl std::fmt::Debug for UploadDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadDescriptor")
            .field("filename", &self.filename)
            .field("folder", &self.folder)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Result of a successful store: the reference and the exact number of bytes written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub reference: String,
    pub size_bytes: u64,
}

/// URL granting access to one stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUrl {
    pub url: String,
    /// `None` when the URL does not decay (local backend)
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub reference: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
}
