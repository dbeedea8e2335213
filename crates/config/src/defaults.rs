/// Default values for configuration fields

pub fn tcp_nodelay() -> bool {
    true
}

pub fn timeout_secs() -> u64 {
    60
}

pub fn max_body_size() -> usize {
    100
}

pub fn max_concurrent_requests() -> usize {
    1000
}

pub fn allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

pub fn streaming_threshold_mb() -> u64 {
    16  // Stored files larger than 16MB are streamed instead of read into memory
}

pub fn enable_compression() -> bool {
    true
}

// Storage defaults

/// Default lifetime of an issued access URL
pub const DEFAULT_URL_EXPIRY_SECS: u64 = 3600;

/// Longest lifetime a SigV4 presigned URL may have
pub const MAX_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

pub fn url_expiry_secs() -> u64 {
    DEFAULT_URL_EXPIRY_SECS
}

pub fn local_root_dir() -> String {
    "uploads".to_string()
}

pub fn local_url_prefix() -> String {
    "/files".to_string()
}

pub fn remote_region() -> String {
    "us-east-1".to_string()
}

pub fn local_settings() -> super::models::LocalSettings {
    super::models::LocalSettings {
        root_dir: local_root_dir(),
        url_prefix: local_url_prefix(),
    }
}

pub fn remote_settings() -> super::models::RemoteSettings {
    super::models::RemoteSettings {
        bucket_name: None,
        region: remote_region(),
        endpoint_url: None,
        force_path_style: false,
        key_prefix: String::new(),
        access_key_id: None,
        secret_access_key: None,
    }
}

pub fn storage_settings() -> super::models::StorageSettings {
    super::models::StorageSettings {
        use_remote: false,
        download_url_expiry_secs: url_expiry_secs(),
        upload_url_expiry_secs: url_expiry_secs(),
        local: local_settings(),
        remote: remote_settings(),
    }
}

pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# ===============================================================================
# Attic Configuration
# ===============================================================================

[server]
# Network
host = "0.0.0.0"                     # Server bind address (0.0.0.0 = all interfaces)
port = 8080                          # Server port
base_url = "http://localhost:8080"   # Public base URL

# Performance
tcp_nodelay = true                   # Disable Nagle's algorithm (lower latency)
timeout_secs = 60                    # Request timeout in seconds
max_concurrent_requests = 1000       # Max simultaneous connections
max_body_size_mb = 100               # Max request body size in MB
streaming_threshold_mb = 16          # Files >16MB streamed, smaller ones read into memory
enable_compression = true            # HTTP compression (gzip/brotli/deflate)

# CORS
allowed_origins = ["*"]              # "*" = all origins | ["https://example.com"] for production

# ===============================================================================
# STORAGE
# ===============================================================================
# The backend is chosen once at startup: the remote store is used only when
# use_remote = true AND a bucket name is set, otherwise files go to local disk.
[storage]
use_remote = false                   # Store attachments in an S3-compatible bucket
download_url_expiry_secs = 3600      # Lifetime of signed download URLs
upload_url_expiry_secs = 3600        # Lifetime of signed direct-upload URLs

[storage.local]
root_dir = "uploads"                 # Upload root (relative to working directory if not absolute)
url_prefix = "/files"                # Route prefix serving local files

[storage.remote]
bucket_name = ""                     # Bucket name (required when use_remote = true)
region = "us-east-1"                 # Bucket region
endpoint_url = ""                    # Custom endpoint for MinIO, R2, ... (empty = AWS)
force_path_style = false             # Path-style addressing (usually needed for MinIO)
key_prefix = ""                      # Prefix for all object keys (optional)
# Leave both empty to resolve credentials from the environment, the shared
# AWS profile (~/.aws/credentials) or the instance/container identity.
access_key_id = ""
secret_access_key = ""
"#;
