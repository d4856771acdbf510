use async_trait::async_trait;
use azlight_common::diagnostic::{Diagnosable, DiagnosticCode, Error};
use azlight_common::Result;
use azlight_domain::stemcell::{BlobMetadata, BlobStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

const METADATA_SUFFIX: &str = ".metadata.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid blob path component: {0:?}")]
    InvalidName(String),
    #[error("Invalid metadata for blob {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Diagnosable for StoreError {
    fn code(&self) -> DiagnosticCode {
        match self {
            Self::Io(_) => DiagnosticCode("FS_IO_ERROR"),
            Self::InvalidName(_) => DiagnosticCode("FS_INVALID_NAME"),
            Self::Metadata { .. } => DiagnosticCode("FS_METADATA_CORRUPT"),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io(_) => Some("Check permissions and free space under the blobstore root".to_string()),
            Self::InvalidName(_) => Some("Account, container and blob names must be single path components".to_string()),
            Self::Metadata { .. } => None,
        }
    }
}

/// Blob storage on the local filesystem.
///
/// A blob lives at `<root>/<account>/<container>/<blob>` and its metadata next to
/// it in `<blob>.metadata.json`.
pub struct FsBlobStore {
    root_path: PathBuf,
}

impl FsBlobStore {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.root_path)
            .await
            .map_err(|e| Error::new(StoreError::Io(e)))
    }

    pub fn blob_path(&self, account: &str, container: &str, blob: &str) -> std::result::Result<PathBuf, StoreError> {
        for part in [account, container, blob] {
            if !is_plain_component(part) {
                return Err(StoreError::InvalidName(part.to_string()));
            }
        }
        Ok(self.root_path.join(account).join(container).join(blob))
    }

    fn metadata_path(blob_path: &Path) -> PathBuf {
        let mut name = blob_path.as_os_str().to_owned();
        name.push(METADATA_SUFFIX);
        PathBuf::from(name)
    }

    async fn write_blob(
        &self,
        account: &str,
        container: &str,
        blob: &str,
        size_kib: u64,
        metadata: &BlobMetadata,
    ) -> std::result::Result<(), StoreError> {
        let path = self.blob_path(account, container, blob)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Metadata first, so a visible blob always has its metadata.
        let data = serde_json::to_vec(metadata).map_err(|e| StoreError::Metadata {
            path: path.clone(),
            source: e,
        })?;
        let mut file = File::create(Self::metadata_path(&path)).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        let file = File::create(&path).await?;
        file.set_len(size_kib * 1024).await?;
        Ok(())
    }

    async fn read_metadata(
        &self,
        account: &str,
        container: &str,
        blob: &str,
    ) -> std::result::Result<Option<BlobMetadata>, StoreError> {
        let path = self.blob_path(account, container, blob)?;
        match fs::metadata(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        }

        let metadata_path = Self::metadata_path(&path);
        let data = match fs::read(&metadata_path).await {
            Ok(data) => data,
            // A blob created without metadata
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Some(BlobMetadata::new())),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let metadata = serde_json::from_slice(&data).map_err(|e| StoreError::Metadata {
            path: metadata_path,
            source: e,
        })?;
        Ok(Some(metadata))
    }

    async fn remove_blob(
        &self,
        account: &str,
        container: &str,
        blob: &str,
    ) -> std::result::Result<(), StoreError> {
        let path = self.blob_path(account, container, blob)?;
        for target in [path.clone(), Self::metadata_path(&path)] {
            match fs::remove_file(&target).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io(e)),
            }
        }
        Ok(())
    }
}

fn is_plain_component(part: &str) -> bool {
    !part.is_empty()
        && part != "."
        && part != ".."
        && !part.contains(['/', '\\'])
        && !part.ends_with(METADATA_SUFFIX)
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn create_empty_page_blob(
        &self,
        account: &str,
        container: &str,
        blob: &str,
        size_kib: u64,
        metadata: &BlobMetadata,
    ) -> Result<()> {
        tracing::debug!("Creating empty page blob {}/{}/{} ({} KiB)", account, container, blob, size_kib);
        self.write_blob(account, container, blob, size_kib, metadata)
            .await
            .map_err(Error::new)
    }

    async fn get_blob_metadata(
        &self,
        account: &str,
        container: &str,
        blob: &str,
    ) -> Result<Option<BlobMetadata>> {
        self.read_metadata(account, container, blob)
            .await
            .map_err(Error::new)
    }

    async fn delete_blob(&self, account: &str, container: &str, blob: &str) -> Result<()> {
        tracing::info!("Deleting blob {}/{}/{}", account, container, blob);
        self.remove_blob(account, container, blob)
            .await
            .map_err(Error::new)
    }
}
