use azlight_common::diagnostic::{Diagnosable, DiagnosticCode};
use thiserror::Error;

/// Prefix of every light stemcell name; the rest is a random UUID.
pub const LIGHT_STEMCELL_PREFIX: &str = "bosh-light-stemcell";

/// Light stemcells only carry metadata, so the backing page blob is the smallest allowed.
pub const EMPTY_BLOB_SIZE_KIB: u64 = 1;

pub const STEMCELL_BLOB_EXTENSION: &str = "vhd";

#[derive(Debug, Error)]
pub enum StemcellError {
    #[error("The image property of the stemcell is invalid. {0}")]
    InvalidImage(String),
    #[error("Cannot find the light stemcell ({image}) in the location '{location}'")]
    ImageNotFound { image: String, location: String },
    #[error("The light stemcell '{name}' does not exist in the storage account '{account}'")]
    NotFound { name: String, account: String },
    #[error("The metadata of the light stemcell '{name}' is corrupt: {source}")]
    MetadataCorrupt {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Diagnosable for StemcellError {
    fn code(&self) -> DiagnosticCode {
        match self {
            Self::InvalidImage(_) => DiagnosticCode("STEMCELL_INVALID_IMAGE"),
            Self::ImageNotFound { .. } => DiagnosticCode("STEMCELL_IMAGE_NOT_FOUND"),
            Self::NotFound { .. } => DiagnosticCode("STEMCELL_NOT_FOUND"),
            Self::MetadataCorrupt { .. } => DiagnosticCode("STEMCELL_METADATA_CORRUPT"),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidImage(_) => Some(
                "Declare either 'publisher, offer, sku, version' or 'gallery, definition, version' under 'image'"
                    .to_string(),
            ),
            Self::ImageNotFound { .. } => {
                Some("Check that the image version is published in that location".to_string())
            }
            Self::NotFound { .. } => Some("Check the stemcell name".to_string()),
            Self::MetadataCorrupt { .. } => {
                Some("Delete the stemcell and upload it again".to_string())
            }
        }
    }
}

pub mod account;
pub mod catalog;
pub mod image;
pub mod info;
pub mod manager;
pub mod metadata;
pub mod store;

pub use account::{FixedStorageAccount, StorageAccount, StorageAccountResolver};
pub use catalog::{ImageCatalog, ImageVersion};
pub use image::ImageReference;
pub use info::StemcellInfo;
pub use manager::LightStemcellManager;
pub use metadata::StemcellProperties;
pub use store::{BlobMetadata, BlobStore};
