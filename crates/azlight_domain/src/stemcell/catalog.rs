use async_trait::async_trait;
use azlight_common::Result;
use serde::{Deserialize, Serialize};

/// One version record as listed by the image catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVersion {
    pub name: String,
    pub id: String,
    pub location: String,
}

#[async_trait]
pub trait ImageCatalog: Send + Sync {
    /// Lists the marketplace image versions offered in `location`.
    async fn list_platform_image_versions(
        &self,
        location: &str,
        publisher: &str,
        offer: &str,
        sku: &str,
    ) -> Result<Vec<ImageVersion>>;

    /// Lists the versions of a compute gallery image definition.
    /// Versions may live outside `location`; callers compare `ImageVersion::location`.
    async fn list_gallery_image_versions(
        &self,
        location: &str,
        gallery: &str,
        definition: &str,
    ) -> Result<Vec<ImageVersion>>;
}
