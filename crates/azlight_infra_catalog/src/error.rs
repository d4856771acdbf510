use azlight_common::diagnostic::{Diagnosable, DiagnosticCode, Severity};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid catalog file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate version '{version}' for image {image}")]
    DuplicateVersion { image: String, version: String },
}

impl Diagnosable for CatalogError {
    fn code(&self) -> DiagnosticCode {
        match self {
            Self::NotFound(_) => DiagnosticCode("CATALOG_NOT_FOUND"),
            Self::Io(_) => DiagnosticCode("FS_IO_ERROR"),
            Self::Parse(_) => DiagnosticCode("CATALOG_PARSE_ERROR"),
            Self::DuplicateVersion { .. } => DiagnosticCode("CATALOG_DUPLICATE_VERSION"),
        }
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound(_) => Some("Check catalog.path in the CPI config.".to_string()),
            Self::Parse(_) => Some("The catalog must list platform_images and gallery_images.".to_string()),
            Self::DuplicateVersion { .. } => Some("Each image version may be listed once per location.".to_string()),
            _ => None,
        }
    }
}
