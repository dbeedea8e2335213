use super::{disk, parser};
use crate::errors::ApiError;
use crate::handlers::models::AppState;
use axum::{
    extract::{Path, State},
    response::Response,
};

/// Serves an object stored by the local backend.
///
/// The caller is expected to have authorized the request before handing out
/// the URL; local URLs carry no signature or expiry.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(requested_path): Path<String>,
) -> Result<Response, ApiError> {
    tracing::debug!("serve_file: requested_path = '{}'", requested_path);

    let root = state.files_root.as_ref().ok_or(ApiError::NotFound)?;
    let reference = parser::parse_reference(&requested_path)?;

    disk::serve_from_disk(root.join(reference), reference, state.streaming_threshold_bytes).await
}
