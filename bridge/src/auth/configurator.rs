//! Grant-code prompt surface
//!
//! The login flow asks its host to show a short form and waits for the
//! submitted code on a channel. The [`Configurator`] trait is that host
//! surface; the console implementation covers standalone runs.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::BridgeError;

/// Handle for one pending configuration prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptHandle(Uuid);

impl PromptHandle {
    /// Create a fresh handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PromptHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// One input field of a prompt form
#[derive(Debug, Clone)]
pub struct ConfigField {
    /// Field identifier submitted back with the value
    pub id: String,

    /// Human-readable field label
    pub name: String,
}

/// A request to present a prompt form to the user
#[derive(Debug, Clone)]
pub struct ConfigRequest {
    pub title: String,
    pub description: String,
    pub submit_caption: String,
    pub fields: Vec<ConfigField>,
}

/// A grant code submitted through a prompt
#[derive(Debug, Clone)]
pub struct CodeSubmission {
    pub client_code: String,
}

/// Host surface that can show a prompt form and retire it again.
///
/// Submissions do not flow back through this trait; they arrive on the
/// channel the login flow listens on.
#[async_trait]
pub trait Configurator: Send + Sync {
    /// Open a prompt and return its handle
    async fn request_config(&self, request: ConfigRequest) -> Result<PromptHandle, BridgeError>;

    /// Retire a previously opened prompt
    async fn request_done(&self, handle: PromptHandle) -> Result<(), BridgeError>;
}

/// Console-backed configurator for standalone runs.
///
/// Prints the form to stdout; submissions are read from stdin by
/// [`spawn_console_reader`].
pub struct ConsoleConfigurator;

#[async_trait]
impl Configurator for ConsoleConfigurator {
    async fn request_config(&self, request: ConfigRequest) -> Result<PromptHandle, BridgeError> {
        println!();
        println!("=== {} ===", request.title);
        println!("{}", request.description);
        for field in &request.fields {
            println!("{}:", field.name);
        }

        Ok(PromptHandle::new())
    }

    async fn request_done(&self, handle: PromptHandle) -> Result<(), BridgeError> {
        debug!("Prompt {:?} retired", handle);
        Ok(())
    }
}

/// Pump stdin lines into the submission channel until it closes
pub fn spawn_console_reader(tx: mpsc::Sender<CodeSubmission>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let code = line.trim().to_string();
                    if code.is_empty() {
                        continue;
                    }
                    let submission = CodeSubmission { client_code: code };
                    if tx.send(submission).await.is_err() {
                        // Receiver dropped, the login flow is done
                        return;
                    }
                }
                Ok(None) => return,
                Err(e) => {
                    warn!("Failed to read from stdin: {}", e);
                    return;
                }
            }
        }
    })
}
