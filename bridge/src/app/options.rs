//! Application configuration options

use std::time::Duration;

use crate::storage::layout::StorageLayout;
use crate::workers::poller;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Skydrop API base URL
    pub api_base_url: String,

    /// OAuth client key issued for this integration
    pub client_key: String,

    /// OAuth client secret issued for this integration
    pub client_secret: String,

    /// Storage configuration
    pub storage: StorageOptions,

    /// Poller worker options
    pub poller: poller::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            api_base_url: "https://api.skydrop.com".to_string(),
            client_key: String::new(),
            client_secret: String::new(),
            storage: StorageOptions::default(),
            poller: poller::Options::default(),
        }
    }
}

/// Lifecycle options for the bridge
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Storage configuration options
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Storage layout paths
    pub layout: StorageLayout,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            layout: StorageLayout::default(),
        }
    }
}
