use super::image::ImageReference;
use super::metadata::StemcellProperties;
use super::StemcellError;
use serde_json::Value;
use std::fmt;

/// A stemcell as seen by the rest of the CPI: the image id to boot from, plus
/// the properties it was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct StemcellInfo {
    uri: String,
    metadata: StemcellProperties,
}

impl StemcellInfo {
    pub fn new(uri: impl Into<String>, metadata: StemcellProperties) -> Self {
        Self {
            uri: uri.into(),
            metadata,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn metadata(&self) -> &StemcellProperties {
        &self.metadata
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.metadata.get("version").and_then(Value::as_str)
    }

    /// Lower-cased `os_type`, `linux` when unset.
    pub fn os_type(&self) -> String {
        self.metadata
            .get("os_type")
            .and_then(Value::as_str)
            .map(str::to_lowercase)
            .unwrap_or_else(|| "linux".to_string())
    }

    pub fn is_windows(&self) -> bool {
        self.os_type() == "windows"
    }

    /// Root disk size in MiB. Metadata read back from a blob holds it as a string.
    pub fn disk_size(&self) -> Option<u64> {
        match self.metadata.get("disk")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_light_stemcell(&self) -> bool {
        self.metadata.contains_key("image")
    }

    pub fn image(&self) -> Result<ImageReference, StemcellError> {
        ImageReference::from_properties(&self.metadata)
    }
}

impl fmt::Display for StemcellInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StemcellInfo(uri: {}, name: {}, version: {}, os_type: {})",
            self.uri,
            self.name().unwrap_or("-"),
            self.version().unwrap_or("-"),
            self.os_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(metadata: Value) -> StemcellInfo {
        StemcellInfo::new("image-id", metadata.as_object().cloned().unwrap())
    }

    #[test]
    fn test_defaults() {
        let info = info(json!({}));
        assert_eq!(info.os_type(), "linux");
        assert!(!info.is_windows());
        assert!(!info.is_light_stemcell());
        assert_eq!(info.disk_size(), None);
        assert_eq!(info.name(), None);
    }

    #[test]
    fn test_accessors() {
        let info = info(json!({
            "name": "bosh-azure-hyperv-windows2019-go_agent",
            "version": "2019.71",
            "os_type": "Windows",
            "disk": "128000",
            "image": { "publisher": "p", "offer": "o", "sku": "s", "version": "2019.71" }
        }));
        assert_eq!(info.uri(), "image-id");
        assert!(info.is_windows());
        assert_eq!(info.disk_size(), Some(128000));
        assert!(info.is_light_stemcell());
        assert_eq!(info.image().unwrap().version(), "2019.71");
        assert!(info.to_string().contains("windows"));
    }
}
