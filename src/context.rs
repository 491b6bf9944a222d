use crate::asset_store::{AssetStoreError, AssetStoreManager};
use crate::company::CompanyProfile;
use crate::config::Config;
use crate::import::BulkImportPipeline;
use crate::listing::ListingController;
use crate::record::{Fields, RecordSchema, COMMENT_SCHEMA, TOUR_SCHEMA};
use crate::record_store::{SharedRecordStore, SqliteRecordStore, StoreError};
use crate::upload::UploadCoordinator;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Asset store error: {0}")]
    Asset(#[from] AssetStoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Backends shared by every screen of the back office.
///
/// Built once at startup and passed to whatever needs a store; there are
/// no process-wide instances.
#[derive(Clone)]
pub struct BackOffice {
    pub records: SharedRecordStore,
    pub assets: AssetStoreManager,
    pub page_size: usize,
}

impl BackOffice {
    pub fn new(records: SharedRecordStore, assets: AssetStoreManager) -> Self {
        BackOffice {
            records,
            assets,
            page_size: crate::listing::DEFAULT_PAGE_SIZE,
        }
    }

    /// Open the SQLite record store and the configured asset backend
    pub async fn from_config(config: &Config) -> Result<Self, ContextError> {
        if let Some(parent) = config.database_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let records = SqliteRecordStore::new(&config.database_path.to_string_lossy()).await?;
        let assets = AssetStoreManager::from_config(&config.storage).await?;
        info!("Back office ready ({})", config.database_path.display());

        Ok(BackOffice {
            records: Arc::new(records),
            assets,
            page_size: config.page_size,
        })
    }

    pub fn listing(&self, schema: &'static RecordSchema) -> ListingController {
        ListingController::new(self.records.clone(), schema).with_page_size(self.page_size)
    }

    pub fn comments_listing(&self) -> ListingController {
        self.listing(&COMMENT_SCHEMA)
    }

    pub fn tours_listing(&self) -> ListingController {
        self.listing(&TOUR_SCHEMA)
    }

    pub fn comment_import(&self) -> BulkImportPipeline {
        BulkImportPipeline::new(self.records.clone(), &COMMENT_SCHEMA)
    }

    /// Upload coordinator for an add (empty draft) or edit form
    pub fn upload_form(&self, draft: Fields) -> UploadCoordinator {
        UploadCoordinator::for_draft(self.assets.clone(), draft)
    }

    pub fn company(&self) -> CompanyProfile {
        CompanyProfile::new(self.records.clone(), self.assets.clone())
    }
}
