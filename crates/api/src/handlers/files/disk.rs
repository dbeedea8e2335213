use super::parser::display_name;
use crate::errors::ApiError;
use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::io;
use std::path::PathBuf;
use tokio_util::io::ReaderStream;

/// Serves a stored file from disk, either by streaming or loading into memory.
/// The threshold is configurable via server.streaming_threshold_mb
pub async fn serve_from_disk(
    full_path: PathBuf,
    reference: &str,
    streaming_threshold_bytes: u64,
) -> Result<Response, ApiError> {
    let metadata = match tokio::fs::metadata(&full_path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(ApiError::NotFound),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("serve_file: no stored object at '{}'", reference);
            return Err(ApiError::NotFound);
        }
        Err(e) => return Err(ApiError::IoError(e)),
    };

    let file_size = metadata.len();
    let body = if file_size > streaming_threshold_bytes {
        tracing::debug!("serve_file: streaming '{}' ({} bytes)", reference, file_size);
        let file = tokio::fs::File::open(&full_path).await?;
        Body::from_stream(ReaderStream::new(file))
    } else {
        Body::from(tokio::fs::read(&full_path).await?)
    };

    let mime_type = mime_guess::from_path(&full_path)
        .first_or_octet_stream()
        .to_string();

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime_type),
            (header::CONTENT_LENGTH, file_size.to_string()),
        ],
        body,
    )
        .into_response();

    // Sanitized names are plain ASCII, so this only fails on unexpected input
    let disposition = format!("inline; filename=\"{}\"", display_name(reference));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}
