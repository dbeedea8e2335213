use super::models::Config;

pub const ENV_USE_REMOTE: &str = "ATTIC_USE_REMOTE";
pub const ENV_S3_BUCKET: &str = "ATTIC_S3_BUCKET";
pub const ENV_S3_REGION: &str = "ATTIC_S3_REGION";
pub const ENV_S3_ENDPOINT: &str = "ATTIC_S3_ENDPOINT";
pub const ENV_S3_ACCESS_KEY_ID: &str = "ATTIC_S3_ACCESS_KEY_ID";
pub const ENV_S3_SECRET_ACCESS_KEY: &str = "ATTIC_S3_SECRET_ACCESS_KEY";
pub const ENV_UPLOAD_DIR: &str = "ATTIC_UPLOAD_DIR";

impl Config {
    /// Applies `ATTIC_*` variables from the process environment
    pub fn apply_env_overrides(&mut self) -> Vec<&'static str> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup, returning the keys that were used
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();

        if let Some(raw) = lookup(ENV_USE_REMOTE) {
            match parse_bool(&raw) {
                Some(value) => {
                    self.storage.use_remote = value;
                    applied.push(ENV_USE_REMOTE);
                }
                None => tracing::warn!("Ignoring {}: '{}' is not a boolean", ENV_USE_REMOTE, raw),
            }
        }

        let remote = &mut self.storage.remote;
        let string_overrides: [(&'static str, &mut Option<String>); 4] = [
            (ENV_S3_BUCKET, &mut remote.bucket_name),
            (ENV_S3_ENDPOINT, &mut remote.endpoint_url),
            (ENV_S3_ACCESS_KEY_ID, &mut remote.access_key_id),
            (ENV_S3_SECRET_ACCESS_KEY, &mut remote.secret_access_key),
        ];
        for (key, slot) in string_overrides {
            if let Some(value) = lookup(key) {
                *slot = Some(value);
                applied.push(key);
            }
        }

        if let Some(region) = lookup(ENV_S3_REGION) {
            remote.region = region;
            applied.push(ENV_S3_REGION);
        }

        if let Some(root) = lookup(ENV_UPLOAD_DIR) {
            self.storage.local.root_dir = root;
            applied.push(ENV_UPLOAD_DIR);
        }

        applied
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
