//! Error types for the Skydrop bridge

use thiserror::Error;

/// Main error type for the bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API client error: {0}")]
    ClientError(#[from] skydrop_client::Error),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Prompt error: {0}")]
    PromptError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Setup error: {0}")]
    SetupError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for BridgeError {
    fn from(err: anyhow::Error) -> Self {
        BridgeError::Internal(err.to_string())
    }
}
