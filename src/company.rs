// # Company Profile
//
// Company-wide documents and brand images:
// - `companyInfo/info`: contact details, only ever updated in place
// - `companyIntroduction`: one rich-text document, stamped on every save
// - brand assets: the logo (first blob under logos/) and every banner

use crate::asset_store::{AssetNamespace, AssetStoreError, AssetStoreManager};
use crate::domain::{CompanyInfo, CompanyIntroduction, Document, Stored};
use crate::record::RecordId;
use crate::record_store::{RecordQuery, SharedRecordStore, StoreError};
use crate::validation::UploadFile;
use thiserror::Error;
use tracing::{debug, info};

/// Identifier of the company info document
pub const COMPANY_INFO_ID: &str = "info";

/// Fixed name every logo upload is stored under
pub const LOGO_FILE_NAME: &str = "logo.png";

#[derive(Error, Debug)]
pub enum CompanyError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Asset store error: {0}")]
    Asset(#[from] AssetStoreError),
    #[error("Malformed document: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrandAssets {
    pub logo: Option<String>,
    pub banners: Vec<String>,
}

pub struct CompanyProfile {
    store: SharedRecordStore,
    assets: AssetStoreManager,
}

impl CompanyProfile {
    pub fn new(store: SharedRecordStore, assets: AssetStoreManager) -> Self {
        CompanyProfile { store, assets }
    }

    pub async fn load_info(&self) -> Result<Option<CompanyInfo>, CompanyError> {
        let id = RecordId::from(COMPANY_INFO_ID);
        match self.store.get(CompanyInfo::COLLECTION, &id).await? {
            Some(record) => Ok(Some(CompanyInfo::from_record(&record)?)),
            None => Ok(None),
        }
    }

    /// Overwrite the info document. The document must already exist.
    pub async fn save_info(&self, info: &CompanyInfo) -> Result<(), CompanyError> {
        let id = RecordId::from(COMPANY_INFO_ID);
        self.store
            .update(CompanyInfo::COLLECTION, &id, &info.to_fields()?)
            .await?;
        info!("Company info saved");
        Ok(())
    }

    /// The introduction document; when several exist the last one wins
    pub async fn load_introduction(
        &self,
    ) -> Result<Option<Stored<CompanyIntroduction>>, CompanyError> {
        let records = self
            .store
            .query(CompanyIntroduction::COLLECTION, &RecordQuery::All)
            .await?;
        match records.last() {
            Some(record) => Ok(Some(Stored::from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Replace the introduction content, stamping `updatedAt`
    pub async fn save_introduction(
        &self,
        id: &RecordId,
        content: impl Into<String>,
    ) -> Result<CompanyIntroduction, CompanyError> {
        let intro = CompanyIntroduction {
            content: content.into(),
            updated_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        self.store
            .update(CompanyIntroduction::COLLECTION, id, &intro.to_fields()?)
            .await?;
        info!("Company introduction {} saved", id);
        Ok(intro)
    }

    pub async fn brand_assets(&self) -> Result<BrandAssets, CompanyError> {
        let (logos, banners) = futures::try_join!(
            self.assets.list(AssetNamespace::Logos),
            self.assets.list(AssetNamespace::Banners),
        )?;
        debug!("Found {} logos, {} banners", logos.len(), banners.len());

        Ok(BrandAssets {
            logo: logos.into_iter().next(),
            banners,
        })
    }

    /// Upload a new logo. It is always stored as `logos/logo.png`.
    pub async fn upload_logo(&self, file: &UploadFile) -> Result<String, CompanyError> {
        let url = self
            .assets
            .upload(AssetNamespace::Logos, &file.renamed(LOGO_FILE_NAME))
            .await?;
        Ok(url)
    }

    pub async fn upload_banner(&self, file: &UploadFile) -> Result<String, CompanyError> {
        Ok(self.assets.upload(AssetNamespace::Banners, file).await?)
    }
}
