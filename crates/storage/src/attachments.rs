//! Task attachment workflows built on top of a [`StorageBackend`].
//!
//! Metadata persistence belongs to the caller and is reached through
//! [`AttachmentRecords`]. Objects are stored before their record is written;
//! if the write fails the object is deleted again so that no orphan is left.
//!
//! [`StorageBackend`]: crate::StorageBackend

use crate::backend::SharedStorage;
use crate::models::{AccessUrl, UploadDescriptor, DEFAULT_URL_EXPIRY_SECS};
use crate::naming::compose_reference;
use crate::StorageError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub task_id: i64,
    pub filename: String,
    pub reference: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRecord {
    pub id: i64,
    pub task_id: i64,
    pub filename: String,
    pub reference: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Attachment metadata store, implemented by the caller's persistence layer
#[async_trait::async_trait]
pub trait AttachmentRecords: Send + Sync {
    async fn insert(&self, attachment: NewAttachment) -> anyhow::Result<AttachmentRecord>;

    async fn find(&self, task_id: i64, attachment_id: i64) -> anyhow::Result<Option<AttachmentRecord>>;

    async fn remove(&self, task_id: i64, attachment_id: i64) -> anyhow::Result<()>;
}

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("Attachment {attachment_id} not found for task {task_id}")]
    NotFound { task_id: i64, attachment_id: i64 },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Attachment record error: {0:#}")]
    Records(anyhow::Error),
}

/// How a caller should hand a download to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// Signed URL on the object store; answer with a redirect
    Redirect(AccessUrl),
    /// Path on the local file route; return it (or serve the bytes)
    Direct { url: AccessUrl, filename: String },
}

/// Signed target for a client-side upload that bypasses the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectUpload {
    pub reference: String,
    pub url: AccessUrl,
}

pub struct AttachmentService {
    storage: SharedStorage,
    records: Arc<dyn AttachmentRecords>,
    download_expiry_secs: u64,
    upload_expiry_secs: u64,
}

impl AttachmentService {
    pub fn new(storage: SharedStorage, records: Arc<dyn AttachmentRecords>) -> Self {
        Self {
            storage,
            records,
            download_expiry_secs: DEFAULT_URL_EXPIRY_SECS,
            upload_expiry_secs: DEFAULT_URL_EXPIRY_SECS,
        }
    }

    pub fn with_expiry(mut self, download_expiry_secs: u64, upload_expiry_secs: u64) -> Self {
        self.download_expiry_secs = download_expiry_secs;
        self.upload_expiry_secs = upload_expiry_secs;
        self
    }

    /// Namespace holding every attachment of a task
    pub fn folder_for(task_id: i64) -> String {
        format!("tasks/{}", task_id)
    }

    /// Stores an upload for `task_id` and records it
    pub async fn create(
        &self,
        task_id: i64,
        reader: impl AsyncRead + Send + Unpin + 'static,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<AttachmentRecord, AttachmentError> {
        let mut upload = UploadDescriptor::new(reader, filename, Self::folder_for(task_id));
        if let Some(content_type) = content_type {
            upload = upload.with_content_type(content_type);
        }

        let stored = self.storage.store(upload).await?;

        self.record(NewAttachment {
            task_id,
            filename: filename.to_string(),
            reference: stored.reference,
            size_bytes: stored.size_bytes,
            content_type: content_type.map(str::to_string),
        })
        .await
    }

    /// Issues a signed URL the client can upload to directly.
    /// Follow up with [`confirm_direct_upload`](Self::confirm_direct_upload).
    pub async fn direct_upload(
        &self,
        task_id: i64,
        filename: &str,
        content_type: &str,
    ) -> Result<DirectUpload, AttachmentError> {
        let reference = compose_reference(&Self::folder_for(task_id), filename)?;
        let url = self
            .storage
            .upload_url(&reference, content_type, self.upload_expiry_secs)
            .await?;

        Ok(DirectUpload { reference, url })
    }

    /// Records an object the client uploaded through a direct upload URL
    pub async fn confirm_direct_upload(
        &self,
        task_id: i64,
        reference: &str,
        filename: &str,
    ) -> Result<AttachmentRecord, AttachmentError> {
        let prefix = format!("{}/", Self::folder_for(task_id));
        if !reference.starts_with(&prefix) {
            return Err(StorageError::InvalidInput(format!(
                "Reference '{}' does not belong to task {}",
                reference, task_id
            ))
            .into());
        }

        let metadata = self.storage.stat(reference).await?;

        self.record(NewAttachment {
            task_id,
            filename: filename.to_string(),
            reference: metadata.reference,
            size_bytes: metadata.size_bytes,
            content_type: metadata.content_type,
        })
        .await
    }

    pub async fn download(&self, task_id: i64, attachment_id: i64) -> Result<Download, AttachmentError> {
        let record = self.find(task_id, attachment_id).await?;
        let url = self
            .storage
            .download_url(&record.reference, self.download_expiry_secs)
            .await?;

        if self.storage.is_remote() {
            Ok(Download::Redirect(url))
        } else {
            Ok(Download::Direct {
                url,
                filename: record.filename,
            })
        }
    }

    /// Deletes the stored object, then its record. An object that is already
    /// gone does not block removal of the record.
    pub async fn delete(&self, task_id: i64, attachment_id: i64) -> Result<(), AttachmentError> {
        let record = self.find(task_id, attachment_id).await?;

        if !self.storage.delete(&record.reference).await? {
            tracing::debug!("Object {} was already gone", record.reference);
        }

        self.records
            .remove(task_id, attachment_id)
            .await
            .map_err(AttachmentError::Records)
    }

    async fn find(&self, task_id: i64, attachment_id: i64) -> Result<AttachmentRecord, AttachmentError> {
        self.records
            .find(task_id, attachment_id)
            .await
            .map_err(AttachmentError::Records)?
            .ok_or(AttachmentError::NotFound { task_id, attachment_id })
    }

    /// Writes the record, deleting the stored object again if that fails
    async fn record(&self, attachment: NewAttachment) -> Result<AttachmentRecord, AttachmentError> {
        let reference = attachment.reference.clone();

        match self.records.insert(attachment).await {
            Ok(record) => Ok(record),
            Err(e) => {
                match self.storage.delete(&reference).await {
                    Ok(_) => tracing::warn!("Record insert failed, removed stored object {}", reference),
                    Err(cleanup) => tracing::error!(
                        "Record insert failed and stored object {} could not be removed: {}",
                        reference,
                        cleanup
                    ),
                }
                Err(AttachmentError::Records(e))
            }
        }
    }
}
