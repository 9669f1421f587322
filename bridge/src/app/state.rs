//! Application state management

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{error, info};
use url::Url;

use skydrop_client::SkydropClient;

use crate::app::options::AppOptions;
use crate::auth::store::{FileTokenStore, TokenStore};
use crate::bus::dispatcher::Dispatcher;
use crate::entity::registry::EntityRegistry;
use crate::errors::BridgeError;
use crate::poll::updater::Updater;
use crate::session::Session;

/// Main application state
pub struct AppState {
    /// Shared API session
    pub session: Arc<dyn Session>,

    /// Durable token persistence
    pub token_store: Arc<dyn TokenStore>,

    /// Update signal bus
    pub dispatcher: Dispatcher,

    /// Update coordinator
    pub updater: Arc<Updater>,

    /// Projected switch registry
    pub registry: Arc<EntityRegistry>,
}

impl AppState {
    /// Initialize application state.
    ///
    /// Builds the session and seeds it with whatever pair the token store
    /// holds; a missing or unreadable store leaves the session without
    /// credentials and the login flow takes it from there.
    pub async fn init(options: &AppOptions) -> Result<Self, BridgeError> {
        info!("Initializing application state...");

        // Create the API session
        let base_url = Url::parse(&options.api_base_url)
            .map_err(|e| BridgeError::ConfigError(format!("invalid API base URL: {}", e)))?;
        let client_secret: SecretString = options.client_secret.clone().into();
        let client = SkydropClient::new(base_url, options.client_key.clone(), client_secret)?;
        let session: Arc<dyn Session> = Arc::new(client);

        // Create the token store
        let token_store: Arc<dyn TokenStore> =
            Arc::new(FileTokenStore::new(options.storage.layout.token_file()));

        // Restore persisted credentials
        match token_store.load().await {
            Ok(Some(pair)) => {
                info!("Restored stored token pair");
                session.load_token_data(&pair).await;
            }
            Ok(None) => {
                info!("No stored token pair found");
            }
            Err(e) => {
                error!("Could not load stored token pair - {}", e);
            }
        }

        // Create the signal bus, updater and registry
        let dispatcher = Dispatcher::default();
        let updater = Arc::new(Updater::new(
            session.clone(),
            token_store.clone(),
            dispatcher.clone(),
        ));
        let registry = Arc::new(EntityRegistry::new(session.clone()));

        Ok(Self {
            session,
            token_store,
            dispatcher,
            updater,
            registry,
        })
    }
}
