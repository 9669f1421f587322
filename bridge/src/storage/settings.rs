//! Settings file management

use serde::{Deserialize, Serialize};

use crate::errors::BridgeError;
use crate::logs::LogLevel;

/// Bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Skydrop API configuration
    #[serde(default)]
    pub api: ApiSettings,

    /// Polling interval in seconds
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
}

fn default_scan_interval() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            api: ApiSettings::default(),
            scan_interval_secs: 30,
        }
    }
}

/// Skydrop API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL for the Skydrop API
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// OAuth client key issued for this integration
    #[serde(default)]
    pub client_key: String,

    /// OAuth client secret issued for this integration
    #[serde(default)]
    pub client_secret: String,
}

fn default_api_url() -> String {
    "https://api.skydrop.com".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            client_key: String::new(),
            client_secret: String::new(),
        }
    }
}

/// Assert that setup has provided the OAuth client credentials
pub fn assert_configured(settings: &Settings) -> Result<(), BridgeError> {
    if settings.api.client_key.is_empty() || settings.api.client_secret.is_empty() {
        return Err(BridgeError::ConfigError(
            "client_key and client_secret are required, run setup first".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api.base_url, "https://api.skydrop.com");
        assert_eq!(settings.scan_interval_secs, 30);
        assert!(assert_configured(&settings).is_err());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"api": {"client_key": "k", "client_secret": "s"}}"#)
                .unwrap();
        assert_eq!(settings.api.base_url, "https://api.skydrop.com");
        assert_eq!(settings.scan_interval_secs, 30);
        assert!(assert_configured(&settings).is_ok());
    }
}
