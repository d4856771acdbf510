use crate::error::CatalogError;
use crate::model::CatalogFile;
use async_trait::async_trait;
use azlight_common::diagnostic::Error;
use azlight_common::Result;
use azlight_domain::stemcell::{ImageCatalog, ImageVersion};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

type PlatformKey = (String, String, String, String);
type GalleryKey = (String, String);

/// An image catalog read from a JSON file instead of the Azure compute API.
///
/// Locations are stored lower-cased.
/// Platform images are listed per location. Gallery versions are listed with
/// their own location and are not filtered by the requested one.
#[derive(Debug, Default)]
pub struct StaticImageCatalog {
    platform: HashMap<PlatformKey, Vec<ImageVersion>>,
    gallery: HashMap<GalleryKey, Vec<ImageVersion>>,
}

impl StaticImageCatalog {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::new(CatalogError::NotFound(path.to_path_buf())))
            }
            Err(e) => return Err(Error::new(CatalogError::Io(e))),
        };

        let file: CatalogFile = serde_json::from_slice(&data)
            .map_err(|e| Error::new(CatalogError::Parse(e)))?;
        let catalog = Self::from_file(file).map_err(Error::new)?;

        info!(
            "Loaded image catalog from {} ({} platform images, {} gallery images)",
            path.display(),
            catalog.platform.len(),
            catalog.gallery.len()
        );
        Ok(catalog)
    }

    pub fn from_file(file: CatalogFile) -> std::result::Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for image in file.platform_images {
            let label = format!("{}:{}:{}", image.publisher, image.offer, image.sku);
            let location = image.location.to_lowercase();
            let key = (
                location.clone(),
                image.publisher,
                image.offer,
                image.sku,
            );
            let versions = catalog.platform.entry(key).or_default();
            for v in image.versions {
                push_unique(versions, &label, ImageVersion {
                    name: v.name,
                    id: v.id,
                    location: location.clone(),
                })?;
            }
        }

        for image in file.gallery_images {
            let label = format!("{}/{}", image.gallery, image.definition);
            let versions = catalog
                .gallery
                .entry((image.gallery, image.definition))
                .or_default();
            for v in image.versions {
                push_unique(versions, &label, ImageVersion {
                    name: v.name,
                    id: v.id,
                    location: v.location.to_lowercase(),
                })?;
            }
        }

        Ok(catalog)
    }
}

fn push_unique(
    versions: &mut Vec<ImageVersion>,
    label: &str,
    version: ImageVersion,
) -> std::result::Result<(), CatalogError> {
    let duplicate = versions
        .iter()
        .any(|v| v.name == version.name && v.location == version.location);
    if duplicate {
        return Err(CatalogError::DuplicateVersion {
            image: label.to_string(),
            version: version.name,
        });
    }
    versions.push(version);
    Ok(())
}

#[async_trait]
impl ImageCatalog for StaticImageCatalog {
    async fn list_platform_image_versions(
        &self,
        location: &str,
        publisher: &str,
        offer: &str,
        sku: &str,
    ) -> Result<Vec<ImageVersion>> {
        let key = (
            location.to_lowercase(),
            publisher.to_string(),
            offer.to_string(),
            sku.to_string(),
        );
        let versions = self.platform.get(&key).cloned().unwrap_or_default();
        debug!("Found {} versions of {}:{}:{} in {}", versions.len(), publisher, offer, sku, location);
        Ok(versions)
    }

    async fn list_gallery_image_versions(
        &self,
        location: &str,
        gallery: &str,
        definition: &str,
    ) -> Result<Vec<ImageVersion>> {
        let versions = self
            .gallery
            .get(&(gallery.to_string(), definition.to_string()))
            .cloned()
            .unwrap_or_default();
        debug!("Found {} versions of {}/{} (requested from {})", versions.len(), gallery, definition, location);
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CATALOG: &str = r#"{
        "platform_images": [
            {
                "location": "eastus",
                "publisher": "canonical",
                "offer": "ubuntu",
                "sku": "18.04",
                "versions": [
                    { "name": "1.0.0", "id": "/locations/eastus/canonical/ubuntu/18.04/1.0.0" },
                    { "name": "1.0.1", "id": "/locations/eastus/canonical/ubuntu/18.04/1.0.1" }
                ]
            },
            {
                "location": "westeurope",
                "publisher": "canonical",
                "offer": "ubuntu",
                "sku": "18.04",
                "versions": [
                    { "name": "1.0.0", "id": "/locations/westeurope/canonical/ubuntu/18.04/1.0.0" }
                ]
            }
        ],
        "gallery_images": [
            {
                "gallery": "bosh",
                "definition": "jammy",
                "versions": [
                    { "name": "1.2.3", "id": "/galleries/bosh/images/jammy/versions/1.2.3", "location": "westeurope" }
                ]
            }
        ]
    }"#;

    async fn load() -> StaticImageCatalog {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        StaticImageCatalog::load(file.path()).await.unwrap()
    }

    #[tokio::test]
    async fn test_platform_versions_are_scoped_by_location() {
        let catalog = load().await;

        let east = catalog
            .list_platform_image_versions("EastUS", "canonical", "ubuntu", "18.04")
            .await
            .unwrap();
        assert_eq!(east.len(), 2);
        assert!(east.iter().all(|v| v.location == "eastus"));

        let west = catalog
            .list_platform_image_versions("westeurope", "canonical", "ubuntu", "18.04")
            .await
            .unwrap();
        assert_eq!(west.len(), 1);
        assert_eq!(west[0].id, "/locations/westeurope/canonical/ubuntu/18.04/1.0.0");

        let none = catalog
            .list_platform_image_versions("eastus", "canonical", "ubuntu", "20.04")
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_gallery_versions_ignore_requested_location() {
        let catalog = load().await;

        let versions = catalog
            .list_gallery_image_versions("eastus", "bosh", "jammy")
            .await
            .unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].location, "westeurope");
    }

    #[tokio::test]
    async fn test_missing_catalog_file() {
        let err = StaticImageCatalog::load("/no/such/catalog.json").await.unwrap_err();
        assert!(err.is("CATALOG_NOT_FOUND"));
    }

    #[test]
    fn test_duplicate_versions_differing_in_location_case_are_rejected() {
        let file: CatalogFile = serde_json::from_str(
            r#"{
                "platform_images": [
                    {
                        "location": "EastUS",
                        "publisher": "canonical",
                        "offer": "ubuntu",
                        "sku": "18.04",
                        "versions": [{ "name": "1.0.0", "id": "a" }]
                    },
                    {
                        "location": "eastus",
                        "publisher": "canonical",
                        "offer": "ubuntu",
                        "sku": "18.04",
                        "versions": [{ "name": "1.0.0", "id": "b" }]
                    }
                ]
            }"#,
        )
        .unwrap();

        assert!(matches!(
            StaticImageCatalog::from_file(file),
            Err(CatalogError::DuplicateVersion { .. })
        ));
    }

    #[tokio::test]
    async fn test_stored_locations_are_lower_cased() {
        let file: CatalogFile = serde_json::from_str(
            r#"{
                "platform_images": [{
                    "location": "WestEurope",
                    "publisher": "canonical",
                    "offer": "ubuntu",
                    "sku": "18.04",
                    "versions": [{ "name": "1.0.0", "id": "a" }]
                }],
                "gallery_images": [{
                    "gallery": "bosh",
                    "definition": "jammy",
                    "versions": [{ "name": "1", "id": "g", "location": "EastUS" }]
                }]
            }"#,
        )
        .unwrap();
        let catalog = StaticImageCatalog::from_file(file).unwrap();

        let platform = catalog
            .list_platform_image_versions("westeurope", "canonical", "ubuntu", "18.04")
            .await
            .unwrap();
        assert_eq!(platform[0].location, "westeurope");

        let gallery = catalog
            .list_gallery_image_versions("eastus", "bosh", "jammy")
            .await
            .unwrap();
        assert_eq!(gallery[0].location, "eastus");
    }

    #[test]
    fn test_duplicate_versions_are_rejected() {
        let file: CatalogFile = serde_json::from_str(
            r#"{
                "gallery_images": [
                    {
                        "gallery": "bosh",
                        "definition": "jammy",
                        "versions": [
                            { "name": "1", "id": "a", "location": "eastus" },
                            { "name": "1", "id": "b", "location": "eastus" }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();

        assert!(matches!(
            StaticImageCatalog::from_file(file),
            Err(CatalogError::DuplicateVersion { .. })
        ));
    }
}
