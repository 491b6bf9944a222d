use crate::asset_store::S3Config;
use crate::listing::DEFAULT_PAGE_SIZE;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

const ENV_DATABASE_PATH: &str = "TOURDESK_DATABASE_PATH";
const ENV_USE_LOCAL_STORAGE: &str = "TOURDESK_USE_LOCAL_STORAGE";
const ENV_LOCAL_STORAGE_PATH: &str = "TOURDESK_LOCAL_STORAGE_PATH";
const ENV_PUBLIC_BASE_URL: &str = "TOURDESK_PUBLIC_BASE_URL";
const ENV_S3_BUCKET: &str = "TOURDESK_S3_BUCKET";
const ENV_S3_REGION: &str = "TOURDESK_S3_REGION";
const ENV_S3_ACCESS_KEY_ID: &str = "TOURDESK_S3_ACCESS_KEY_ID";
const ENV_S3_SECRET_ACCESS_KEY: &str = "TOURDESK_S3_SECRET_ACCESS_KEY";
const ENV_S3_ENDPOINT_URL: &str = "TOURDESK_S3_ENDPOINT_URL";
const ENV_S3_PUBLIC_URL: &str = "TOURDESK_S3_PUBLIC_URL";
const ENV_PAGE_SIZE: &str = "TOURDESK_PAGE_SIZE";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Where uploaded images go
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    /// Filesystem directory, served under `public_base_url`
    Local {
        root: PathBuf,
        public_base_url: String,
    },
    S3(S3Config),
}

/// Application configuration, read from the environment (and `.env`)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file backing the record store
    pub database_path: PathBuf,
    pub storage: StorageBackend,
    /// Initial listing page size
    pub page_size: usize,
}

impl Config {
    /// Load `.env` if present, then read the process environment
    pub fn load() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            debug!("Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_path = match get(ENV_DATABASE_PATH) {
            Some(path) => PathBuf::from(path),
            None => default_data_dir()?.join("records.db"),
        };

        let use_local_storage = get(ENV_USE_LOCAL_STORAGE)
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let storage = if use_local_storage {
            let root = match get(ENV_LOCAL_STORAGE_PATH) {
                Some(path) => PathBuf::from(path),
                None => default_data_dir()?.join("assets"),
            };
            let public_base_url = get(ENV_PUBLIC_BASE_URL)
                .unwrap_or_else(|| format!("file://{}", root.display()));
            info!("Using local asset storage at {}", root.display());
            StorageBackend::Local {
                root,
                public_base_url,
            }
        } else {
            let require = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));
            let s3 = S3Config {
                bucket_name: require(ENV_S3_BUCKET)?,
                region: require(ENV_S3_REGION)?,
                access_key_id: require(ENV_S3_ACCESS_KEY_ID)?,
                secret_access_key: require(ENV_S3_SECRET_ACCESS_KEY)?,
                endpoint_url: get(ENV_S3_ENDPOINT_URL),
                public_url: get(ENV_S3_PUBLIC_URL),
            };
            info!("Using S3 asset storage (bucket {})", s3.bucket_name);
            StorageBackend::S3(s3)
        };

        let page_size = match get(ENV_PAGE_SIZE) {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: ENV_PAGE_SIZE,
                        value,
                    })
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Config {
            database_path,
            storage,
            page_size,
        })
    }
}

/// `~/.tourdesk`
fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".tourdesk"))
        .ok_or(ConfigError::NoHomeDir)
}
