use async_trait::async_trait;
use azlight_common::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccount {
    pub name: String,
    pub location: String,
}

#[async_trait]
pub trait StorageAccountResolver: Send + Sync {
    async fn default_storage_account(&self) -> Result<StorageAccount>;
}

/// Resolves to a single account known up front, usually taken from the CPI config.
#[derive(Debug, Clone)]
pub struct FixedStorageAccount {
    account: StorageAccount,
}

impl FixedStorageAccount {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            account: StorageAccount {
                name: name.into(),
                location: location.into(),
            },
        }
    }
}

#[async_trait]
impl StorageAccountResolver for FixedStorageAccount {
    async fn default_storage_account(&self) -> Result<StorageAccount> {
        Ok(self.account.clone())
    }
}
