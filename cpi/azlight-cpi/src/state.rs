use azlight_common::config::CpiConfig;
use azlight_common::Result;
use azlight_domain::stemcell::{FixedStorageAccount, LightStemcellManager};
use azlight_infra_catalog::StaticImageCatalog;
use azlight_infra_fs::FsBlobStore;
use std::sync::Arc;
use tracing::Span;

pub struct CpiState {
    pub stemcells: LightStemcellManager,
}

impl CpiState {
    pub async fn from_config(config: &CpiConfig, span: Span) -> Result<Self> {
        let blob_store = Arc::new(FsBlobStore::new(config.blobstore.root.clone()));
        blob_store.ensure_dirs().await?;

        let catalog = Arc::new(StaticImageCatalog::load(&config.catalog.path).await?);
        let accounts = FixedStorageAccount::new(
            config.azure.storage_account_name.clone(),
            config.azure.location.clone(),
        );

        let stemcells = LightStemcellManager::new(blob_store, &accounts, catalog, span)
            .await?
            .with_container(config.azure.stemcell_container.clone());

        Ok(Self { stemcells })
    }
}
