//! Polling worker for the recurring update cycle

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info};

use crate::poll::updater::{UpdateOutcome, Updater};

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Interval between update cycles
    pub scan_interval: Duration,

    /// Initial delay before the first tick
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(30),
            initial_delay: Duration::from_secs(5),
        }
    }
}

/// Run the poller worker.
///
/// The next tick is armed only after the current cycle completes, so cycles
/// never pile up behind a slow fetch.
pub async fn run<S, F>(
    options: &Options,
    updater: &Updater,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poller worker starting...");

    // Initial delay
    sleep_fn(options.initial_delay).await;

    loop {
        // Check for shutdown
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = sleep_fn(options.scan_interval) => {
                // Continue with the next cycle
            }
        }

        debug!("Polling for updates...");

        match updater.update_data().await {
            UpdateOutcome::Updated => {
                debug!("Update cycle completed");
            }
            UpdateOutcome::Skipped => {
                debug!("Update cycle skipped by the throttle");
            }
            UpdateOutcome::Failed => {
                // Already logged by the updater, the next tick retries
                debug!("Update cycle failed");
            }
        }
    }
}
