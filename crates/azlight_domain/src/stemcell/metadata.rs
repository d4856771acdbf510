use super::store::BlobMetadata;
use super::StemcellError;
use serde_json::{Map, Value};

/// Caller-supplied stemcell properties, `image` included.
pub type StemcellProperties = Map<String, Value>;

const IMAGE_KEY: &str = "image";

/// Flattens stemcell properties into blob metadata.
///
/// `image` and every other non-string value are stored as JSON text; strings are
/// stored as is.
pub fn encode(properties: &StemcellProperties) -> BlobMetadata {
    properties
        .iter()
        .map(|(key, value)| {
            let encoded = match value {
                Value::String(s) if key != IMAGE_KEY => s.clone(),
                // Display of a Value is its compact JSON text
                other => other.to_string(),
            };
            (key.clone(), encoded)
        })
        .collect()
}

/// Rebuilds stemcell properties from blob metadata. Only `image` is parsed back
/// into a structured value.
pub fn decode(name: &str, metadata: BlobMetadata) -> Result<StemcellProperties, StemcellError> {
    let mut properties = StemcellProperties::new();
    for (key, value) in metadata {
        let decoded = if key == IMAGE_KEY {
            serde_json::from_str(&value).map_err(|e| StemcellError::MetadataCorrupt {
                name: name.to_string(),
                source: e,
            })?
        } else {
            Value::String(value)
        };
        properties.insert(key, decoded);
    }
    Ok(properties)
}
