//! Durable token persistence

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::tokens::TokenPair;
use crate::errors::BridgeError;
use crate::filesys::file::File;

/// Version tag written into the stored envelope
const STORE_VERSION: u32 = 1;

/// Durable storage for the token pair.
///
/// The bridge restores the pair at startup and overwrites it after every
/// grant-code exchange or refresh.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored pair, if any
    async fn load(&self) -> Result<Option<TokenPair>, BridgeError>;

    /// Overwrite the stored pair
    async fn save(&self, pair: &TokenPair) -> Result<(), BridgeError>;
}

/// Versioned envelope around the persisted pair
#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    version: u32,
    data: TokenPair,
}

/// File-backed token store
pub struct FileTokenStore {
    file: File,
}

impl FileTokenStore {
    /// Create a store backed by the given file
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<TokenPair>, BridgeError> {
        if !self.file.exists().await {
            return Ok(None);
        }

        let stored: StoredTokens = self.file.read_json().await.map_err(|e| {
            BridgeError::StorageError(format!(
                "failed to read token file {:?}: {}",
                self.file.path(),
                e
            ))
        })?;
        Ok(Some(stored.data))
    }

    async fn save(&self, pair: &TokenPair) -> Result<(), BridgeError> {
        let stored = StoredTokens {
            version: STORE_VERSION,
            data: pair.clone(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;

        self.file.write_atomic(contents.as_bytes()).await?;
        self.file.set_permissions_600().await?;

        debug!("Token pair persisted to {:?}", self.file.path());
        Ok(())
    }
}
