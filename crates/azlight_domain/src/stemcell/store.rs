use async_trait::async_trait;
use azlight_common::Result;
use std::collections::BTreeMap;

/// Blob metadata is a flat string mapping; nested values are serialized.
pub type BlobMetadata = BTreeMap<String, String>;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn create_empty_page_blob(
        &self,
        account: &str,
        container: &str,
        blob: &str,
        size_kib: u64,
        metadata: &BlobMetadata,
    ) -> Result<()>;

    /// Returns `None` when the blob does not exist.
    async fn get_blob_metadata(
        &self,
        account: &str,
        container: &str,
        blob: &str,
    ) -> Result<Option<BlobMetadata>>;

    async fn delete_blob(&self, account: &str, container: &str, blob: &str) -> Result<()>;
}
