use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// Object is absent. Never returned by `delete`, which reports absence as `Ok(false)`.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The medium (disk or object store) rejected or failed the operation
    #[error("Storage unavailable for '{0}': {1}")]
    StorageUnavailable(String, String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Signing failed for '{0}': {1}")]
    SigningFailed(String, String),

    #[error("Operation not supported by {0} backend: {1}")]
    Unsupported(&'static str, &'static str),

    #[error("Invalid storage configuration: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub(crate) fn unavailable(key: &str, err: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable(key.to_string(), err.to_string())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// True for failures worth retrying later (the medium itself was unavailable)
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(..))
    }
}

impl From<attic_config::ConfigError> for StorageError {
    fn from(err: attic_config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
