use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerSettings,
    #[serde(default = "super::defaults::storage_settings")]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    #[serde(default = "super::defaults::tcp_nodelay")]
    pub tcp_nodelay: bool,
    #[serde(default = "super::defaults::timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "super::defaults::max_body_size")]
    pub max_body_size_mb: usize,
    #[serde(default = "super::defaults::allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "super::defaults::max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default = "super::defaults::streaming_threshold_mb")]
    pub streaming_threshold_mb: u64,
    #[serde(default = "super::defaults::enable_compression")]
    pub enable_compression: bool,
}

/// Storage selection and backend settings, read once at startup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub use_remote: bool,
    #[serde(default = "super::defaults::url_expiry_secs")]
    pub download_url_expiry_secs: u64,
    #[serde(default = "super::defaults::url_expiry_secs")]
    pub upload_url_expiry_secs: u64,
    #[serde(default = "super::defaults::local_settings")]
    pub local: LocalSettings,
    #[serde(default = "super::defaults::remote_settings")]
    pub remote: RemoteSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalSettings {
    #[serde(default = "super::defaults::local_root_dir")]
    pub root_dir: String,
    #[serde(default = "super::defaults::local_url_prefix")]
    pub url_prefix: String,
}

/// S3-compatible object store settings.
///
/// Empty strings are treated the same as missing values, so the default
/// template can list every key without enabling anything.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteSettings {
    #[serde(default)]
    pub bucket_name: Option<String>,
    #[serde(default = "super::defaults::remote_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    #[serde(default)]
    pub key_prefix: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

impl StorageSettings {
    /// True when the remote store is enabled and has somewhere to write
    pub fn wants_remote(&self) -> bool {
        self.use_remote && self.remote.bucket().is_some()
    }
}

impl RemoteSettings {
    pub fn bucket(&self) -> Option<&str> {
        non_empty(&self.bucket_name)
    }

    pub fn endpoint(&self) -> Option<&str> {
        non_empty(&self.endpoint_url)
    }

    /// Returns the configured key pair, or `None` when credentials should come
    /// from the ambient chain. A half-configured pair is an error.
    pub fn explicit_credentials(&self) -> Result<Option<(&str, &str)>, crate::ConfigError> {
        match (non_empty(&self.access_key_id), non_empty(&self.secret_access_key)) {
            (Some(key), Some(secret)) => Ok(Some((key, secret))),
            (None, None) => Ok(None),
            _ => Err(crate::ConfigError::InvalidConfig(
                "storage.remote.access_key_id and secret_access_key must be set together".to_string(),
            )),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
