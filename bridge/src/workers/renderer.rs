//! Renderer worker
//!
//! Listens for update signals and re-renders every projected switch from
//! the session's latest controller snapshot.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::bus::dispatcher::UpdateSignal;
use crate::entity::registry::EntityRegistry;

/// Run the renderer worker
pub async fn run(
    registry: Arc<EntityRegistry>,
    mut signals: broadcast::Receiver<UpdateSignal>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Renderer worker starting...");

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Renderer worker shutting down...");
                return;
            }
            received = signals.recv() => match received {
                Ok(UpdateSignal) => {
                    registry.handle_update().await;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Signals carry no payload, one catch-up render covers them all
                    warn!("Renderer lagged behind {} update signal(s)", missed);
                    registry.handle_update().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Update signal bus closed, renderer worker exiting");
                    return;
                }
            }
        }
    }
}
