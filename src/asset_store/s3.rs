use super::{AssetStore, AssetStoreError};
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

/// S3 configuration for the asset store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct S3Config {
    pub bucket_name: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: Option<String>, // For MinIO/S3-compatible services
    /// Base URL objects are publicly served from (CDN or website endpoint)
    pub public_url: Option<String>,
}

impl S3Config {
    pub fn validate(&self) -> Result<(), AssetStoreError> {
        if self.bucket_name.trim().is_empty() {
            return Err(AssetStoreError::Config(
                "Bucket name cannot be empty".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(AssetStoreError::Config(
                "Region cannot be empty".to_string(),
            ));
        }
        if self.access_key_id.trim().is_empty() {
            return Err(AssetStoreError::Config(
                "Access key ID cannot be empty".to_string(),
            ));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(AssetStoreError::Config(
                "Secret access key cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Public URL of an object key
    pub fn object_url(&self, key: &str) -> String {
        match &self.public_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket_name, self.region, key
            ),
        }
    }
}

/// Production S3 asset store implementation
pub struct S3AssetStore {
    client: Client,
    config: S3Config,
}

impl S3AssetStore {
    /// Create a new S3 asset store client
    pub async fn new(config: S3Config) -> Result<Self, AssetStoreError> {
        config.validate()?;

        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None, // session_token
            None, // expiration
            "tourdesk-s3-config",
        );

        let mut aws_config_builder = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        // Set custom endpoint if provided (for S3-compatible services)
        if let Some(endpoint) = &config.endpoint_url {
            aws_config_builder = aws_config_builder.endpoint_url(endpoint);
        }

        let aws_config = aws_config_builder.load().await;
        let client = Client::new(&aws_config);

        Ok(S3AssetStore { client, config })
    }
}

#[async_trait::async_trait]
impl AssetStore for S3AssetStore {
    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, AssetStoreError> {
        self.client
            .put_object()
            .bucket(&self.config.bucket_name)
            .key(key)
            .body(data.to_vec().into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AssetStoreError::Upload(format!("Put object failed: {}", e)))?;

        info!("S3AssetStore: uploaded {} ({} bytes)", key, data.len());
        Ok(self.config.object_url(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, AssetStoreError> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.config.bucket_name)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| AssetStoreError::SdkError(format!("List objects failed: {}", e)))?;

        let mut keys: Vec<&str> = response
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .filter(|key| !key.ends_with('/'))
            .collect();
        keys.sort_unstable();

        Ok(keys
            .into_iter()
            .map(|key| self.config.object_url(key))
            .collect())
    }
}
