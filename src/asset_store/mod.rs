// # Asset Store
//
// Blob storage for images referenced by records (avatars, tour images,
// logos, banners...). Every blob lives under a namespaced key and is
// retrieved through a stable URL usable directly as an image source.
//
// - `AssetStore`: backend trait (local filesystem or S3)
// - `AssetStoreManager`: validates payloads before handing them to the backend
//
// No retry is performed here; retry policy belongs to the caller.

mod local;
mod s3;

pub use local::LocalAssetStore;
pub use s3::{S3AssetStore, S3Config};

use crate::config::StorageBackend;
use crate::validation::{validate_image, UploadFile, ValidationError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum AssetStoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error("S3 SDK error: {0}")]
    SdkError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Key prefixes of the blob store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetNamespace {
    Logos,
    Banners,
    Avatars,
    TourImages,
    ItineraryImages,
    Images,
    CompanyIntroduction,
}

impl AssetNamespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            AssetNamespace::Logos => "logos/",
            AssetNamespace::Banners => "banners/",
            AssetNamespace::Avatars => "avatars/",
            AssetNamespace::TourImages => "tour-images/",
            AssetNamespace::ItineraryImages => "itinerary-images/",
            AssetNamespace::Images => "images/",
            AssetNamespace::CompanyIntroduction => "company-introduction/",
        }
    }

    /// Build the object key for a file name.
    /// Example: (Avatars, "C:\\pics\\me.png") -> avatars/me.png
    pub fn key(&self, file_name: &str) -> String {
        let base = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();

        if base.is_empty() {
            // Fallback for nameless uploads
            return format!("{}{}", self.prefix(), uuid::Uuid::new_v4());
        }

        format!("{}{}", self.prefix(), base)
    }
}

/// Trait for blob storage operations (allows mocking for tests)
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `data` under `key`, returning the public retrieval URL
    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, AssetStoreError>;

    /// Retrieval URLs of every object under `prefix`, ordered by key
    async fn list(&self, prefix: &str) -> Result<Vec<String>, AssetStoreError>;
}

/// Asset store front used by the rest of the crate
#[derive(Clone)]
pub struct AssetStoreManager {
    storage: Arc<dyn AssetStore>,
}

impl std::fmt::Debug for AssetStoreManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetStoreManager")
            .field("storage", &"<dyn AssetStore>")
            .finish()
    }
}

impl AssetStoreManager {
    /// Wrap an existing backend
    pub fn from_storage(storage: Arc<dyn AssetStore>) -> Self {
        AssetStoreManager { storage }
    }

    /// Build the backend selected in configuration
    pub async fn from_config(backend: &StorageBackend) -> Result<Self, AssetStoreError> {
        let storage: Arc<dyn AssetStore> = match backend {
            StorageBackend::Local {
                root,
                public_base_url,
            } => Arc::new(LocalAssetStore::new(root.clone(), public_base_url.clone())),
            StorageBackend::S3(config) => Arc::new(S3AssetStore::new(config.clone()).await?),
        };
        Ok(AssetStoreManager { storage })
    }

    /// Validate and upload an image, returning its retrieval URL.
    ///
    /// Type and size checks run before the backend is touched, so a rejected
    /// file never reaches the network.
    pub async fn upload(
        &self,
        namespace: AssetNamespace,
        file: &UploadFile,
    ) -> Result<String, AssetStoreError> {
        let content_type = validate_image(file)?;
        let key = namespace.key(&file.name);

        debug!("Uploading {} ({} bytes, {})", key, file.size(), content_type);
        let url = self
            .storage
            .put_object(&key, &file.bytes, content_type)
            .await?;
        info!("Uploaded {} -> {}", key, url);

        Ok(url)
    }

    /// Retrieval URLs of every blob in a namespace
    pub async fn list(&self, namespace: AssetNamespace) -> Result<Vec<String>, AssetStoreError> {
        self.storage.list(namespace.prefix()).await
    }
}
