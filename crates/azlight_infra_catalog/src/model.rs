use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub platform_images: Vec<PlatformImage>,
    #[serde(default)]
    pub gallery_images: Vec<GalleryImage>,
}

/// A marketplace image as offered in one location.
#[derive(Debug, Deserialize)]
pub struct PlatformImage {
    pub location: String,
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub versions: Vec<PlatformVersion>,
}

#[derive(Debug, Deserialize)]
pub struct PlatformVersion {
    pub name: String,
    pub id: String,
}

/// A gallery image definition; each version carries its own location.
#[derive(Debug, Deserialize)]
pub struct GalleryImage {
    pub gallery: String,
    pub definition: String,
    pub versions: Vec<GalleryVersion>,
}

#[derive(Debug, Deserialize)]
pub struct GalleryVersion {
    pub name: String,
    pub id: String,
    pub location: String,
}
