use crate::backend::StorageBackend;
use crate::credentials::{self, CredentialSource};
use crate::models::{
    AccessUrl, BackendKind, ObjectMetadata, StoredObject, UploadDescriptor, MAX_URL_EXPIRY_SECS,
};
use crate::naming::{compose_reference, validate_reference};
use crate::StorageError;
use attic_config::RemoteSettings;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::{primitives::ByteStream, Client};
use chrono::Utc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Uploads at least this large go through a multipart upload, one part at a time
pub const DEFAULT_PART_SIZE: usize = 8 * 1024 * 1024;

/// S3-compatible storage backend
/// Compatible with: AWS S3, Cloudflare R2, MinIO, DigitalOcean Spaces, etc.
pub struct S3Backend {
    client: Client,
    bucket_name: String,
    bucket_prefix: String,
    part_size: usize,
}

impl S3Backend {
    pub async fn from_settings(settings: &RemoteSettings) -> Result<Self, StorageError> {
        let bucket_name = settings
            .bucket()
            .ok_or_else(|| StorageError::ConfigError("storage.remote.bucket_name is empty".to_string()))?
            .to_string();

        let (provider, source) = credentials::provider_for(settings)?;
        if source == CredentialSource::Ambient {
            credentials::probe(&provider, source).await;
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(provider)
            .region(Region::new(settings.region.clone()));
        if let Some(endpoint) = settings.endpoint() {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.force_path_style)
            .build();

        tracing::info!(
            "Initialized S3 storage backend: bucket={}, region={}, endpoint={}, credentials={:?}",
            bucket_name,
            settings.region,
            settings.endpoint().unwrap_or("aws"),
            source
        );

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket_name,
            bucket_prefix: settings.key_prefix.trim_matches('/').to_string(),
            part_size: DEFAULT_PART_SIZE,
        })
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    fn build_key(&self, remote_key: &str) -> String {
        if self.bucket_prefix.is_empty() {
            remote_key.to_string()
        } else {
            format!("{}/{}", self.bucket_prefix, remote_key)
        }
    }

    fn presigning_config(key: &str, expires_in_secs: u64) -> Result<PresigningConfig, StorageError> {
        if expires_in_secs == 0 || expires_in_secs > MAX_URL_EXPIRY_SECS {
            return Err(StorageError::InvalidInput(format!(
                "URL expiry must be between 1 and {} seconds (got {})",
                MAX_URL_EXPIRY_SECS, expires_in_secs
            )));
        }

        PresigningConfig::expires_in(Duration::from_secs(expires_in_secs))
            .map_err(|e| StorageError::SigningFailed(key.to_string(), e.to_string()))
    }

    fn access_url(uri: &str, expires_in_secs: u64) -> AccessUrl {
        // Bounded by MAX_URL_EXPIRY_SECS, so the cast cannot truncate
        let expires_at = Utc::now() + chrono::Duration::seconds(expires_in_secs as i64);
        AccessUrl {
            url: uri.to_string(),
            expires_at: Some(expires_at),
        }
    }

    /// HeadObject, with "not found" as `None`.
    ///
    /// S3 only answers 404 for a missing key when the caller holds
    /// `s3:ListBucket` on the bucket; without it the answer is 403 and this
    /// returns `StorageUnavailable`, since a denied HEAD says nothing about
    /// whether the object exists.
    async fn head(&self, key: &str) -> Result<Option<HeadObjectOutput>, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
        {
            Ok(output) => Ok(Some(output)),
            Err(e) if e.as_service_error().map_or(false, HeadObjectError::is_not_found) => Ok(None),
            Err(e) => Err(StorageError::unavailable(key, DisplayErrorContext(&e))),
        }
    }

    async fn put_single(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        // PutObject is all-or-nothing: a failed request leaves no object behind
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_length(body.len() as i64)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::unavailable(key, DisplayErrorContext(&e)))?;
        Ok(())
    }

    /// Streams `first` and the rest of `reader` as a multipart upload.
    /// The object only appears once the upload is completed; any failure
    /// aborts it so no parts are left behind.
    async fn put_multipart(
        &self,
        key: &str,
        first: Vec<u8>,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        content_type: Option<&str>,
    ) -> Result<u64, StorageError> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket_name)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| StorageError::unavailable(key, DisplayErrorContext(&e)))?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| StorageError::unavailable(key, "CreateMultipartUpload returned no upload id"))?
            .to_string();

        match self.upload_parts(key, &upload_id, first, reader).await {
            Ok((parts, size_bytes)) => {
                self.client
                    .complete_multipart_upload()
                    .bucket(&self.bucket_name)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(parts)).build())
                    .send()
                    .await
                    .map_err(|e| StorageError::unavailable(key, DisplayErrorContext(&e)))?;
                Ok(size_bytes)
            }
            Err(e) => {
                self.abort_multipart(key, &upload_id).await;
                Err(e)
            }
        }
    }

    async fn upload_parts(
        &self,
        key: &str,
        upload_id: &str,
        first: Vec<u8>,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(Vec<CompletedPart>, u64), StorageError> {
        let mut parts = Vec::new();
        let mut size_bytes = 0u64;
        let mut part = first;
        let mut part_number = 1;

        loop {
            size_bytes += part.len() as u64;
            tracing::debug!("Uploading part {} of {} ({} bytes)", part_number, key, part.len());

            let output = self
                .client
                .upload_part()
                .bucket(&self.bucket_name)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .content_length(part.len() as i64)
                .body(ByteStream::from(part))
                .send()
                .await
                .map_err(|e| StorageError::unavailable(key, DisplayErrorContext(&e)))?;

            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .set_e_tag(output.e_tag().map(str::to_string))
                    .set_checksum_crc32(output.checksum_crc32().map(str::to_string))
                    .build(),
            );

            part = read_part(reader, self.part_size)
                .await
                .map_err(|e| StorageError::unavailable(key, e))?;
            if part.is_empty() {
                return Ok((parts, size_bytes));
            }
            part_number += 1;
        }
    }

    async fn abort_multipart(&self, key: &str, upload_id: &str) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket_name)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
        {
            tracing::warn!(
                "Failed to abort multipart upload {} of {}: {}",
                upload_id,
                key,
                DisplayErrorContext(&e)
            );
        }
    }
}

/// Reads up to `limit` bytes; a short result means the stream has ended
async fn read_part(reader: &mut (dyn AsyncRead + Send + Unpin), limit: usize) -> std::io::Result<Vec<u8>> {
    let mut part = Vec::new();
    reader.take(limit as u64).read_to_end(&mut part).await?;
    Ok(part)
}

#[async_trait::async_trait]
impl StorageBackend for S3Backend {
    async fn store(&self, mut upload: UploadDescriptor) -> Result<StoredObject, StorageError> {
        let reference = compose_reference(&upload.folder, &upload.filename)?;
        let key = self.build_key(&reference);
        let content_type = upload.content_type.as_deref();

        let first = read_part(&mut upload.reader, self.part_size)
            .await
            .map_err(|e| StorageError::unavailable(&key, e))?;

        let size_bytes = if first.len() < self.part_size {
            let size_bytes = first.len() as u64;
            tracing::info!("Uploading {} ({} bytes) to S3 bucket {}", key, size_bytes, self.bucket_name);
            self.put_single(&key, first, content_type).await?;
            size_bytes
        } else {
            tracing::info!("Starting multipart upload of {} to S3 bucket {}", key, self.bucket_name);
            self.put_multipart(&key, first, &mut upload.reader, content_type).await?
        };

        tracing::info!("Upload complete: {} ({} bytes)", key, size_bytes);
        Ok(StoredObject { reference, size_bytes })
    }

    async fn delete(&self, reference: &str) -> Result<bool, StorageError> {
        validate_reference(reference)?;
        let key = self.build_key(reference);

        // DeleteObject succeeds for missing keys, so check first
        if self.head(&key).await?.is_none() {
            tracing::debug!("Delete of {} skipped: not found in bucket {}", key, self.bucket_name);
            return Ok(false);
        }

        tracing::info!("Deleting {} from S3 bucket {}", key, self.bucket_name);

        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::unavailable(&key, DisplayErrorContext(&e)))?;

        tracing::info!("Delete complete: {}", key);
        Ok(true)
    }

    async fn download_url(&self, reference: &str, expires_in_secs: u64) -> Result<AccessUrl, StorageError> {
        validate_reference(reference)?;
        let key = self.build_key(reference);
        let presigning = Self::presigning_config(&key, expires_in_secs)?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::SigningFailed(key.clone(), DisplayErrorContext(&e).to_string()))?;

        tracing::debug!("Issued download URL for {} ({}s)", key, expires_in_secs);
        Ok(Self::access_url(presigned.uri(), expires_in_secs))
    }

    async fn upload_url(
        &self,
        reference: &str,
        content_type: &str,
        expires_in_secs: u64,
    ) -> Result<AccessUrl, StorageError> {
        validate_reference(reference)?;
        if content_type.trim().is_empty() {
            return Err(StorageError::InvalidInput("Content type is required for upload URLs".to_string()));
        }

        let key = self.build_key(reference);
        let presigning = Self::presigning_config(&key, expires_in_secs)?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::SigningFailed(key.clone(), DisplayErrorContext(&e).to_string()))?;

        tracing::debug!("Issued upload URL for {} ({}, {}s)", key, content_type, expires_in_secs);
        Ok(Self::access_url(presigned.uri(), expires_in_secs))
    }

    async fn stat(&self, reference: &str) -> Result<ObjectMetadata, StorageError> {
        validate_reference(reference)?;
        let key = self.build_key(reference);

        let output = self
            .head(&key)
            .await?
            .ok_or_else(|| StorageError::NotFound(reference.to_string()))?;

        Ok(ObjectMetadata {
            reference: reference.to_string(),
            size_bytes: output.content_length().unwrap_or(0).max(0) as u64,
            content_type: output.content_type().map(str::to_string),
        })
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }
}
