//! Skydrop Bridge - Entry Point
//!
//! Exposes Skydrop irrigation controllers and their watering zones to a
//! smart home as toggle switches, kept fresh by periodic cloud polling.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use skybridge::app::options::{AppOptions, StorageOptions};
use skybridge::app::run::run;
use skybridge::logs::{init_logging, LogOptions};
use skybridge::setup::wizard::setup;
use skybridge::storage::layout::StorageLayout;
use skybridge::storage::settings::{assert_configured, Settings};
use skybridge::utils::version_info;
use skybridge::workers::poller;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    // Run the setup wizard
    if cli_args.contains_key("setup") {
        return setup(&cli_args).await;
    }

    // Run the bridge starting here

    // Retrieve the settings file
    let layout = match cli_args.get("dir") {
        Some(dir) => StorageLayout::new(dir),
        None => StorageLayout::default(),
    };
    let settings_file = layout.settings_file();
    let settings = match settings_file.read_json::<Settings>().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {}", e);
            eprintln!("Run: skybridge --setup --key=<client_key> --secret=<client_secret>");
            return;
        }
    };

    // Check the bridge has been configured
    if let Err(e) = assert_configured(&settings) {
        eprintln!("Bridge is not yet configured: {}", e);
        eprintln!("Run: skybridge --setup --key=<client_key> --secret=<client_secret>");
        return;
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    // Run the bridge
    let options = AppOptions {
        api_base_url: settings.api.base_url.clone(),
        client_key: settings.api.client_key.clone(),
        client_secret: settings.api.client_secret.clone(),
        storage: StorageOptions { layout },
        poller: poller::Options {
            scan_interval: Duration::from_secs(settings.scan_interval_secs),
            ..Default::default()
        },
        ..Default::default()
    };

    info!(
        "Running Skydrop bridge (api: {}, scan interval: {}s)",
        options.api_base_url, settings.scan_interval_secs
    );
    let result = run(version.version, options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the bridge: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
