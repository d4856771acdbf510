use crate::diagnostic::{self, Diagnosable, DiagnosticCode};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_STEMCELL_CONTAINER: &str = "stemcell";

/// Environment variable consulted when no config path is given on the command line.
pub const CONFIG_PATH_ENV: &str = "AZLIGHT_CPI_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

impl Diagnosable for ConfigError {
    fn code(&self) -> DiagnosticCode {
        match self {
            Self::NotFound(_) => DiagnosticCode("CONFIG_NOT_FOUND"),
            Self::Io { .. } => DiagnosticCode("CONFIG_IO_ERROR"),
            Self::Parse { .. } => DiagnosticCode("CONFIG_PARSE_ERROR"),
            Self::Invalid(_) => DiagnosticCode("CONFIG_INVALID"),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound(_) => Some(format!(
                "Pass the config path as the first argument or set {}",
                CONFIG_PATH_ENV
            )),
            Self::Parse { .. } | Self::Invalid(_) => {
                Some("Check the JSON structure of the CPI config".to_string())
            }
            Self::Io { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CpiConfig {
    pub azure: AzureConfig,
    pub blobstore: BlobstoreConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AzureConfig {
    /// Location of the default storage account.
    pub location: String,
    pub storage_account_name: String,
    #[serde(default = "default_stemcell_container")]
    pub stemcell_container: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlobstoreConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

fn default_stemcell_container() -> String {
    DEFAULT_STEMCELL_CONTAINER.to_string()
}

impl CpiConfig {
    pub async fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                diagnostic::Error::new(ConfigError::NotFound(path.to_path_buf()))
            } else {
                diagnostic::Error::new(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            diagnostic::Error::new(ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })
        })?;
        config.validate()?;

        tracing::debug!("Loaded CPI config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.azure.location.trim().is_empty() {
            return Err(diagnostic::Error::new(ConfigError::Invalid(
                "azure.location must not be empty".to_string(),
            )));
        }
        if self.azure.storage_account_name.trim().is_empty() {
            return Err(diagnostic::Error::new(ConfigError::Invalid(
                "azure.storage_account_name must not be empty".to_string(),
            )));
        }
        if self.azure.stemcell_container.trim().is_empty() {
            return Err(diagnostic::Error::new(ConfigError::Invalid(
                "azure.stemcell_container must not be empty".to_string(),
            )));
        }
        Ok(())
    }
}
