//! Bridge setup and credential installation

use std::collections::HashMap;

use tracing::{error, info};

use crate::logs::{init_logging, LogOptions};
use crate::storage::layout::StorageLayout;
use crate::storage::settings::{assert_configured, Settings};
use crate::utils::version_info;

/// Run the setup process
pub async fn setup(cli_args: &HashMap<String, String>) {
    match setup_impl(cli_args).await {
        Ok(_) => {
            info!("Setup successful");
            println!("\n[SUCCESS] Skydrop bridge configured successfully!");
            println!("Start the bridge with: skybridge");
        }
        Err(e) => {
            error!("Setup failed: {:?}", e);
            eprintln!("\n[ERROR] Setup failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn setup_impl(cli_args: &HashMap<String, String>) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize temporary logging
    let log_options = LogOptions {
        stdout: true,
        ..Default::default()
    };
    let _ = init_logging(log_options);

    println!("Skydrop Bridge Setup");
    println!("====================");
    println!();

    let layout = match cli_args.get("dir") {
        Some(dir) => StorageLayout::new(dir),
        None => StorageLayout::default(),
    };

    // Only a single configured instance is allowed
    let settings_file = layout.settings_file();
    if settings_file.exists().await {
        let existing: Settings = settings_file.read_json().await?;
        if assert_configured(&existing).is_ok() {
            return Err(format!(
                "Bridge is already configured (only a single instance is allowed). \
                 Remove {:?} to reconfigure",
                settings_file.path()
            )
            .into());
        }
    }

    // Get the OAuth client key
    let key_env_var = "SKYDROP_CLIENT_KEY";
    let client_key = cli_args
        .get("key")
        .cloned()
        .or_else(|| std::env::var(key_env_var).ok())
        .ok_or_else(|| {
            format!(
                "Missing client key. Provide via --key=<key> or {} environment variable",
                key_env_var
            )
        })?;

    // Get the OAuth client secret
    let secret_env_var = "SKYDROP_CLIENT_SECRET";
    let client_secret = cli_args
        .get("secret")
        .cloned()
        .or_else(|| std::env::var(secret_env_var).ok())
        .ok_or_else(|| {
            format!(
                "Missing client secret. Provide via --secret=<secret> or {} environment variable",
                secret_env_var
            )
        })?;

    if client_key.is_empty() || client_secret.is_empty() {
        return Err("Client key and secret must not be empty".into());
    }

    // Setup storage layout
    println!("Setting up storage at: {:?}", layout.base_dir);
    layout.setup().await?;

    // Get API URL from args or use default
    let mut settings = Settings::default();
    settings.api.client_key = client_key;
    settings.api.client_secret = client_secret;
    if let Some(base_url) = cli_args.get("api") {
        settings.api.base_url = base_url.clone();
    }

    println!("API URL: {}", settings.api.base_url);
    println!();

    settings_file.write_json(&settings).await?;
    settings_file.set_permissions_600().await?;
    println!("Settings saved to: {:?}", settings_file.path());

    // Print version info
    let version = version_info();
    println!();
    println!("Bridge version: {}", version.version);
    println!("Git hash: {}", version.git_hash);
    println!("Build time: {}", version.build_time);

    Ok(())
}
