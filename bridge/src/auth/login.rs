//! Credential acquisition flow
//!
//! Drives the grant-code prompt loop until the session holds a good token
//! pair. The flow is an explicit two-state protocol (awaiting a code, then
//! validated) fed by submissions from the configurator channel rather than
//! nested prompt callbacks.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};

use crate::auth::configurator::{
    CodeSubmission, ConfigField, ConfigRequest, Configurator, PromptHandle,
};
use crate::auth::store::TokenStore;
use crate::errors::BridgeError;
use crate::session::Session;

/// Protocol state of the acquisition flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// No good pair yet, a grant code is needed
    AwaitingCode,
    /// The session holds a good pair
    Validated,
}

/// Credential acquisition flow
pub struct LoginFlow {
    session: Arc<dyn Session>,
    store: Arc<dyn TokenStore>,
    configurator: Arc<dyn Configurator>,
    pending: Mutex<Vec<PromptHandle>>,
}

impl LoginFlow {
    /// Create a new flow over the given session, store and prompt surface
    pub fn new(
        session: Arc<dyn Session>,
        store: Arc<dyn TokenStore>,
        configurator: Arc<dyn Configurator>,
    ) -> Self {
        Self {
            session,
            store,
            configurator,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Whether the session already holds a good token pair
    pub async fn check_login_status(&self) -> LoginState {
        if self.session.token_data().await.is_good() {
            LoginState::Validated
        } else {
            LoginState::AwaitingCode
        }
    }

    /// Run the prompt loop until the session holds a good pair.
    ///
    /// Returns immediately when the pair is already good. Fails only when
    /// the submission channel closes with the flow still awaiting a code,
    /// meaning the prompt was abandoned.
    pub async fn run(
        &self,
        submissions: &mut mpsc::Receiver<CodeSubmission>,
    ) -> Result<(), BridgeError> {
        loop {
            if self.check_login_status().await == LoginState::Validated {
                self.clear_pending_prompts().await;
                return Ok(());
            }

            self.request_configuration().await?;

            let Some(submission) = submissions.recv().await else {
                return Err(BridgeError::AuthError(
                    "credential prompt abandoned before a valid grant code was submitted"
                        .to_string(),
                ));
            };

            self.on_code_submitted(&submission.client_code).await;
        }
    }

    /// Open the grant-code prompt.
    ///
    /// At most one prompt may be outstanding; anything older is retired
    /// before the new one opens.
    pub async fn request_configuration(&self) -> Result<(), BridgeError> {
        // Never open a prompt once the pair is good
        if self.check_login_status().await == LoginState::Validated {
            return Ok(());
        }

        let mut pending = self.pending.lock().await;

        for stale in pending.drain(..) {
            if let Err(e) = self.configurator.request_done(stale).await {
                error!("Failed to retire stale prompt: {}", e);
            }
        }

        let request = ConfigRequest {
            title: "Skydrop".to_string(),
            description: "Please enter the grant code obtained from the Skydrop portal."
                .to_string(),
            submit_caption: "Verify".to_string(),
            fields: vec![ConfigField {
                id: "client_code".to_string(),
                name: "Client code".to_string(),
            }],
        };

        let handle = self.configurator.request_config(request).await?;
        pending.push(handle);
        info!("Waiting for Skydrop grant code...");

        Ok(())
    }

    /// Handle a submitted grant code.
    ///
    /// Exchange failures and persistence failures are logged and leave the
    /// flow awaiting another code or proceeding with in-memory tokens; they
    /// never abort the loop.
    pub async fn on_code_submitted(&self, code: &str) {
        match self.session.get_access_token(code).await {
            Ok(pair) => {
                info!("Grant code accepted, token pair installed");
                if let Err(e) = self.store.save(&pair).await {
                    // The session still holds a good pair, the next refresh
                    // gets another chance to persist it
                    error!("Could not persist token pair - {}", e);
                }
            }
            Err(e) => {
                error!("Could not get Skydrop access token - {}", e);
            }
        }
    }

    /// Retire every outstanding prompt
    pub async fn clear_pending_prompts(&self) {
        let mut pending = self.pending.lock().await;
        for handle in pending.drain(..) {
            if let Err(e) = self.configurator.request_done(handle).await {
                error!("Failed to retire prompt: {}", e);
            }
        }
    }

    /// Number of prompts currently outstanding
    pub async fn pending_prompt_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
