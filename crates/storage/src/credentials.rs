use crate::StorageError;
use attic_config::RemoteSettings;
use aws_config::ecs::EcsCredentialsProvider;
use aws_config::environment::credentials::EnvironmentVariableCredentialsProvider;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::meta::credentials::CredentialsProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;

/// Where the credentials of the remote backend come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Key pair from the config file or `ATTIC_S3_*` overrides
    Explicit,
    /// Environment, shared profile, container identity, instance metadata, in that order
    Ambient,
}

/// Builds the credentials provider once, at backend construction
pub(crate) fn provider_for(
    settings: &RemoteSettings,
) -> Result<(SharedCredentialsProvider, CredentialSource), StorageError> {
    match settings.explicit_credentials()? {
        Some((access_key_id, secret_access_key)) => {
            let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "attic-config");
            Ok((SharedCredentialsProvider::new(credentials), CredentialSource::Explicit))
        }
        None => Ok((SharedCredentialsProvider::new(ambient_chain()), CredentialSource::Ambient)),
    }
}

fn ambient_chain() -> CredentialsProviderChain {
    CredentialsProviderChain::first_try("Environment", EnvironmentVariableCredentialsProvider::new())
        .or_else("Profile", ProfileFileCredentialsProvider::builder().build())
        .or_else("EcsContainer", EcsCredentialsProvider::builder().build())
        .or_else("Ec2InstanceMetadata", ImdsCredentialsProvider::builder().build())
}

/// Resolves the chain once so a missing identity shows up at startup rather
/// than on the first request. Failure is logged, not fatal: signing will
/// report `SigningFailed` if credentials are still missing later.
pub(crate) async fn probe(provider: &SharedCredentialsProvider, source: CredentialSource) {
    match provider.provide_credentials().await {
        Ok(_) => tracing::info!("Resolved S3 credentials ({:?})", source),
        Err(e) => tracing::warn!("No S3 credentials could be resolved yet: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RemoteSettings {
        RemoteSettings {
            bucket_name: Some("attic-test".to_string()),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            force_path_style: false,
            key_prefix: String::new(),
            access_key_id: None,
            secret_access_key: None,
        }
    }

    #[tokio::test]
    async fn test_explicit_credentials_win() {
        let mut settings = settings();
        settings.access_key_id = Some("AKIDEXAMPLE".to_string());
        settings.secret_access_key = Some("secret".to_string());

        let (provider, source) = provider_for(&settings).unwrap();
        assert_eq!(source, CredentialSource::Explicit);

        let credentials = provider.provide_credentials().await.unwrap();
        assert_eq!(credentials.access_key_id(), "AKIDEXAMPLE");
        assert_eq!(credentials.secret_access_key(), "secret");
    }

    #[tokio::test]
    async fn test_missing_credentials_fall_back_to_chain() {
        let (_, source) = provider_for(&settings()).unwrap();
        assert_eq!(source, CredentialSource::Ambient);
    }

    #[test]
    fn test_half_configured_pair_is_rejected() {
        let mut settings = settings();
        settings.secret_access_key = Some("secret".to_string());

        assert!(matches!(provider_for(&settings), Err(StorageError::ConfigError(_))));
    }
}
