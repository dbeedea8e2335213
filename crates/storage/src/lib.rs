mod backend;
mod errors;
mod local;
mod models;
mod selector;

pub mod attachments;
pub mod naming;

#[cfg(feature = "s3")]
mod credentials;
#[cfg(feature = "s3")]
mod s3;

pub use backend::{SharedStorage, StorageBackend};
pub use errors::*;
pub use local::LocalBackend;
pub use models::*;
pub use selector::select_backend;

#[cfg(feature = "s3")]
pub use credentials::CredentialSource;
#[cfg(feature = "s3")]
pub use s3::{S3Backend, DEFAULT_PART_SIZE};
