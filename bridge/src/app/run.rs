//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::auth::configurator::{spawn_console_reader, ConsoleConfigurator};
use crate::auth::login::{LoginFlow, LoginState};
use crate::errors::BridgeError;
use crate::poll::updater::UpdateOutcome;
use crate::workers::{poller, renderer};

/// Run the Skydrop bridge
pub async fn run(
    bridge_version: String,
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), BridgeError> {
    info!("Initializing Skydrop bridge v{}...", bridge_version);

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    // Initialize the app state and workers
    if let Err(e) = init(&options, shutdown_tx.clone(), &mut shutdown_manager).await {
        error!("Failed to start bridge: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    // Shutdown
    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), BridgeError> {
    let app_state = Arc::new(AppState::init(options).await?);

    // Block until the session holds a good token pair
    ensure_logged_in(&app_state).await?;

    // Run the first cycle before any switch exists, so the projection sees
    // real controller state
    let outcome = app_state.updater.update_data().await;
    if outcome != UpdateOutcome::Updated {
        info!("Initial update cycle finished with {:?}", outcome);
    }
    app_state.registry.project().await;

    init_poller_worker(
        options.poller.clone(),
        app_state.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )
    .await?;

    init_renderer_worker(app_state.clone(), shutdown_manager, shutdown_tx.subscribe()).await?;

    Ok(())
}

/// Drive the credential acquisition flow until the session holds a good pair
async fn ensure_logged_in(app_state: &Arc<AppState>) -> Result<(), BridgeError> {
    let configurator = Arc::new(ConsoleConfigurator);
    let flow = LoginFlow::new(
        app_state.session.clone(),
        app_state.token_store.clone(),
        configurator,
    );

    if flow.check_login_status().await == LoginState::Validated {
        info!("Stored token pair is good, credential prompt not needed");
        return Ok(());
    }

    let (tx, mut rx) = mpsc::channel(8);
    let reader = spawn_console_reader(tx);

    let result = flow.run(&mut rx).await;
    reader.abort();
    result
}

async fn init_poller_worker(
    options: poller::Options,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), BridgeError> {
    info!("Initializing poller worker...");

    let updater = app_state.updater.clone();

    let poller_handle = tokio::spawn(async move {
        poller::run(
            &options,
            updater.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_poller_worker_handle(poller_handle)?;
    Ok(())
}

async fn init_renderer_worker(
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), BridgeError> {
    info!("Initializing renderer worker...");

    let registry = app_state.registry.clone();
    let signals = app_state.dispatcher.subscribe();

    let renderer_handle = tokio::spawn(async move {
        renderer::run(
            registry,
            signals,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_renderer_worker_handle(renderer_handle)?;
    Ok(())
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    poller_worker_handle: Option<JoinHandle<()>>,
    renderer_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            poller_worker_handle: None,
            renderer_worker_handle: None,
        }
    }

    pub fn with_poller_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), BridgeError> {
        if self.poller_worker_handle.is_some() {
            return Err(BridgeError::ShutdownError("poller_handle already set".to_string()));
        }
        self.poller_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_renderer_worker_handle(
        &mut self,
        handle: JoinHandle<()>,
    ) -> Result<(), BridgeError> {
        if self.renderer_worker_handle.is_some() {
            return Err(BridgeError::ShutdownError("renderer_handle already set".to_string()));
        }
        self.renderer_worker_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), BridgeError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), BridgeError> {
        info!("Shutting down Skydrop bridge...");

        // 1. Poller worker
        if let Some(handle) = self.poller_worker_handle.take() {
            handle.await.map_err(|e| BridgeError::ShutdownError(e.to_string()))?;
        }

        // 2. Renderer worker
        if let Some(handle) = self.renderer_worker_handle.take() {
            handle.await.map_err(|e| BridgeError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
