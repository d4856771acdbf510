use super::StemcellError;
use serde_json::{Map, Value};
use std::fmt;

const PLATFORM_KEYS: [&str; 3] = ["publisher", "offer", "sku"];
const GALLERY_KEYS: [&str; 2] = ["gallery", "definition"];

/// The image a light stemcell points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    /// Azure Marketplace image.
    Platform {
        publisher: String,
        offer: String,
        sku: String,
        version: String,
    },
    /// Azure Compute Gallery image.
    Gallery {
        gallery: String,
        definition: String,
        version: String,
        resource_group: Option<String>,
    },
}

impl ImageReference {
    /// Classifies the `image` property of a stemcell.
    ///
    /// Fails when `version` is missing, when neither variant is complete, or when
    /// keys of both variants are present.
    pub fn parse(image: &Value) -> Result<Self, StemcellError> {
        let image = image.as_object().ok_or_else(|| {
            StemcellError::InvalidImage("It should be a mapping".to_string())
        })?;

        let version = match image.get("version") {
            Some(_) => required_str(image, "version")?,
            None => {
                return Err(StemcellError::InvalidImage(
                    "It should contain a 'version' key".to_string(),
                ))
            }
        };

        let has_platform = PLATFORM_KEYS.iter().any(|k| image.contains_key(*k));
        let has_gallery = GALLERY_KEYS.iter().any(|k| image.contains_key(*k));

        match (has_platform, has_gallery) {
            (true, true) => Err(StemcellError::InvalidImage(
                "It should not mix 'publisher, offer, sku' with 'gallery, definition'".to_string(),
            )),
            (true, false) if PLATFORM_KEYS.iter().all(|k| image.contains_key(*k)) => {
                Ok(Self::Platform {
                    publisher: required_str(image, "publisher")?,
                    offer: required_str(image, "offer")?,
                    sku: required_str(image, "sku")?,
                    version,
                })
            }
            (false, true) if GALLERY_KEYS.iter().all(|k| image.contains_key(*k)) => {
                let resource_group = match image.get("resource_group") {
                    None | Some(Value::Null) => None,
                    Some(_) => Some(required_str(image, "resource_group")?),
                };
                Ok(Self::Gallery {
                    gallery: required_str(image, "gallery")?,
                    definition: required_str(image, "definition")?,
                    version,
                    resource_group,
                })
            }
            _ => Err(StemcellError::InvalidImage(
                "It should contain either 'publisher, offer, sku' or 'gallery, definition'"
                    .to_string(),
            )),
        }
    }

    /// Parses the `image` entry of a stemcell property mapping.
    pub fn from_properties(properties: &Map<String, Value>) -> Result<Self, StemcellError> {
        match properties.get("image") {
            Some(image) => Self::parse(image),
            None => Err(StemcellError::InvalidImage(
                "The stemcell properties should contain an 'image' key".to_string(),
            )),
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Self::Platform { version, .. } | Self::Gallery { version, .. } => version,
        }
    }

    pub fn is_platform_image(&self) -> bool {
        matches!(self, Self::Platform { .. })
    }

    pub fn is_compute_gallery_image(&self) -> bool {
        matches!(self, Self::Gallery { .. })
    }
}

fn required_str(image: &Map<String, Value>, key: &str) -> Result<String, StemcellError> {
    match image.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(StemcellError::InvalidImage(format!(
            "The '{}' key should not be empty",
            key
        ))),
        Some(_) => Err(StemcellError::InvalidImage(format!(
            "The '{}' key should be a string",
            key
        ))),
        None => Err(StemcellError::InvalidImage(format!(
            "It should contain a '{}' key",
            key
        ))),
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Marketplace URN form
            Self::Platform {
                publisher,
                offer,
                sku,
                version,
            } => write!(f, "{}:{}:{}:{}", publisher, offer, sku, version),
            Self::Gallery {
                gallery,
                definition,
                version,
                ..
            } => write!(f, "{}/{}/{}", gallery, definition, version),
        }
    }
}
