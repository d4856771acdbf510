use super::account::{StorageAccount, StorageAccountResolver};
use super::catalog::{ImageCatalog, ImageVersion};
use super::image::ImageReference;
use super::info::StemcellInfo;
use super::metadata::{self, StemcellProperties};
use super::store::BlobStore;
use super::{StemcellError, EMPTY_BLOB_SIZE_KIB, LIGHT_STEMCELL_PREFIX, STEMCELL_BLOB_EXTENSION};
use azlight_common::config::DEFAULT_STEMCELL_CONTAINER;
use azlight_common::diagnostic::Error;
use azlight_common::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument, Span};
use uuid::Uuid;

/// Manages stemcells that reference an existing platform or gallery image
/// instead of carrying a disk image.
///
/// Each stemcell is an empty page blob in the default storage account whose
/// metadata records the stemcell properties.
pub struct LightStemcellManager {
    blob_store: Arc<dyn BlobStore>,
    catalog: Arc<dyn ImageCatalog>,
    default_account: StorageAccount,
    container: String,
    span: Span,
}

impl LightStemcellManager {
    /// Resolves the default storage account once; every later call uses it.
    ///
    /// Events are emitted under `span`.
    pub async fn new(
        blob_store: Arc<dyn BlobStore>,
        accounts: &dyn StorageAccountResolver,
        catalog: Arc<dyn ImageCatalog>,
        span: Span,
    ) -> Result<Self> {
        let default_account = accounts.default_storage_account().await?;
        Ok(Self {
            blob_store,
            catalog,
            default_account,
            container: DEFAULT_STEMCELL_CONTAINER.to_string(),
            span,
        })
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    #[instrument(parent = &self.span, skip(self, properties))]
    pub async fn create(&self, properties: &StemcellProperties) -> Result<String> {
        info!("create_stemcell({})", display_image(properties));
        let location = &self.default_account.location;
        if self.find_image_version(location, properties).await?.is_none() {
            return Err(Error::new(StemcellError::ImageNotFound {
                image: display_image(properties),
                location: location.clone(),
            }));
        }

        let name = format!("{}-{}", LIGHT_STEMCELL_PREFIX, Uuid::new_v4());
        info!(
            "Uploading metadata for the light stemcell '{}' into the storage account '{}'",
            name, self.default_account.name
        );
        let blob_metadata = metadata::encode(properties);
        self.blob_store
            .create_empty_page_blob(
                &self.default_account.name,
                &self.container,
                &blob_name(&name),
                EMPTY_BLOB_SIZE_KIB,
                &blob_metadata,
            )
            .await?;

        Ok(name)
    }

    /// Deleting a stemcell that does not exist is a no-op.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        info!("delete_stemcell({})", name);
        if self.get_metadata(name).await?.is_none() {
            debug!("The light stemcell '{}' does not exist, nothing to delete", name);
            return Ok(());
        }

        self.blob_store
            .delete_blob(&self.default_account.name, &self.container, &blob_name(name))
            .await
    }

    /// Checks that the stemcell exists and that its image version is available
    /// in `location`, which may differ from the default one.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn exists(&self, location: &str, name: &str) -> Result<bool> {
        info!("has_stemcell?({}, {})", location, name);
        let properties = match self.get_metadata(name).await? {
            Some(properties) => properties,
            None => return Ok(false),
        };

        Ok(self.find_image_version(location, &properties).await?.is_some())
    }

    #[instrument(parent = &self.span, skip(self))]
    pub async fn get_info(&self, name: &str) -> Result<StemcellInfo> {
        info!("get_stemcell_info({})", name);
        let properties = self.get_metadata(name).await?.ok_or_else(|| {
            Error::new(StemcellError::NotFound {
                name: name.to_string(),
                account: self.default_account.name.clone(),
            })
        })?;

        let location = &self.default_account.location;
        let version = self
            .find_image_version(location, &properties)
            .await?
            .ok_or_else(|| {
                Error::new(StemcellError::ImageNotFound {
                    image: display_image(&properties),
                    location: location.clone(),
                })
            })?;

        Ok(StemcellInfo::new(version.id, properties))
    }

    async fn get_metadata(&self, name: &str) -> Result<Option<StemcellProperties>> {
        let blob_metadata = self
            .blob_store
            .get_blob_metadata(&self.default_account.name, &self.container, &blob_name(name))
            .await?;

        match blob_metadata {
            Some(blob_metadata) => metadata::decode(name, blob_metadata)
                .map(Some)
                .map_err(Error::new),
            None => Ok(None),
        }
    }

    /// Looks up the image version the stemcell points at.
    ///
    /// Versions are matched by name on the client side. A match listed in another
    /// location is still returned; only the mismatch is logged.
    async fn find_image_version(
        &self,
        location: &str,
        properties: &StemcellProperties,
    ) -> Result<Option<ImageVersion>> {
        let image = ImageReference::from_properties(properties).map_err(Error::new)?;

        let versions = match &image {
            ImageReference::Platform {
                publisher,
                offer,
                sku,
                ..
            } => {
                debug!(
                    "list_platform_image_versions({}, {}, {}, {})",
                    location, publisher, offer, sku
                );
                self.catalog
                    .list_platform_image_versions(location, publisher, offer, sku)
                    .await?
            }
            ImageReference::Gallery {
                gallery,
                definition,
                version,
                ..
            } => {
                debug!(
                    "list_gallery_image_versions({}, {}, {}, {})",
                    location, gallery, definition, version
                );
                self.catalog
                    .list_gallery_image_versions(location, gallery, definition)
                    .await?
            }
        };

        let found = versions.into_iter().find(|v| v.name == image.version());
        match &found {
            None => debug!("The version '{}' of the image {} is not found", image.version(), image),
            Some(v) if !same_location(&v.location, location) => debug!(
                "The version '{}' of the image {} is not in the location '{}' (found in '{}')",
                image.version(),
                image,
                location,
                v.location
            ),
            Some(_) => {}
        }

        Ok(found)
    }
}

/// Azure location names are case-insensitive.
pub(crate) fn same_location(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn blob_name(name: &str) -> String {
    format!("{}.{}", name, STEMCELL_BLOB_EXTENSION)
}

fn display_image(properties: &StemcellProperties) -> String {
    properties
        .get("image")
        .map(|image| image.to_string())
        .unwrap_or_else(|| "null".to_string())
}
