use super::models::Config;
use crate::{ConfigError, MAX_URL_EXPIRY_SECS};

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig("server.port must not be 0".to_string()));
        }

        let storage = &self.storage;
        for (name, secs) in [
            ("storage.download_url_expiry_secs", storage.download_url_expiry_secs),
            ("storage.upload_url_expiry_secs", storage.upload_url_expiry_secs),
        ] {
            if secs == 0 || secs > MAX_URL_EXPIRY_SECS {
                return Err(ConfigError::InvalidConfig(format!(
                    "{} must be between 1 and {} (got {})",
                    name, MAX_URL_EXPIRY_SECS, secs
                )));
            }
        }

        if storage.local.root_dir.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "storage.local.root_dir must not be empty".to_string(),
            ));
        }

        if !storage.local.url_prefix.starts_with('/') {
            return Err(ConfigError::InvalidConfig(format!(
                "storage.local.url_prefix must start with '/' (got '{}')",
                storage.local.url_prefix
            )));
        }

        storage.remote.explicit_credentials()?;

        if storage.use_remote && storage.remote.bucket().is_none() {
            tracing::warn!("storage.use_remote is set but no bucket is configured; local storage will be used");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_CONFIG_TEMPLATE;

    fn config() -> Config {
        Config::from_toml_str(DEFAULT_CONFIG_TEMPLATE).unwrap()
    }

    #[test]
    fn test_expiry_bounds() {
        let mut config = config();
        config.storage.download_url_expiry_secs = 0;
        assert!(config.validate().is_err());

        config.storage.download_url_expiry_secs = MAX_URL_EXPIRY_SECS;
        assert!(config.validate().is_ok());

        config.storage.upload_url_expiry_secs = MAX_URL_EXPIRY_SECS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_expiry_is_within_limit() {
        let config = config();
        assert_eq!(config.storage.download_url_expiry_secs, crate::DEFAULT_URL_EXPIRY_SECS);
        assert_eq!(config.storage.upload_url_expiry_secs, crate::DEFAULT_URL_EXPIRY_SECS);
        assert!(crate::DEFAULT_URL_EXPIRY_SECS <= MAX_URL_EXPIRY_SECS);
    }

    #[test]
    fn test_half_configured_credentials() {
        let mut config = config();
        config.storage.remote.access_key_id = Some("AKIAEXAMPLE".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidConfig(_))));

        config.storage.remote.secret_access_key = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_url_prefix_must_be_absolute() {
        let mut config = config();
        config.storage.local.url_prefix = "files".to_string();
        assert!(config.validate().is_err());
    }
}
