//! Projected switch registry
//!
//! Holds every switch built from the current controller snapshot and
//! re-renders them whenever an update signal arrives.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::entity::switch::{project_switches, Switch, SwitchEntity};
use crate::session::Session;

/// Rendered view of one switch, for logs and host consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchView {
    pub unique_id: String,
    pub name: String,
    pub icon: &'static str,
    pub is_on: bool,
}

/// Registry of projected switches
pub struct EntityRegistry {
    session: Arc<dyn Session>,
    switches: RwLock<Vec<SwitchEntity>>,
}

impl EntityRegistry {
    /// Create an empty registry over the session
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self {
            session,
            switches: RwLock::new(Vec::new()),
        }
    }

    /// Build the projection from the session's current controller snapshot
    pub async fn project(&self) -> usize {
        let controllers = self.session.controllers().await;
        let switches = project_switches(&self.session, &controllers);
        let count = switches.len();

        *self.switches.write().await = switches;
        info!("{} Skydrop switch(es) added", count);
        count
    }

    /// Re-read the backing state of every switch
    pub async fn handle_update(&self) {
        let mut switches = self.switches.write().await;
        for switch in switches.iter_mut() {
            switch.handle_signal().await;
        }
        debug!("Re-rendered {} switch(es)", switches.len());
    }

    /// Rendered snapshot of every switch
    pub async fn views(&self) -> Vec<SwitchView> {
        self.switches
            .read()
            .await
            .iter()
            .map(|switch| SwitchView {
                unique_id: switch.unique_id(),
                name: switch.name(),
                icon: switch.icon(),
                is_on: switch.is_on(),
            })
            .collect()
    }

    /// Number of projected switches
    pub async fn len(&self) -> usize {
        self.switches.read().await.len()
    }

    /// Whether the registry holds no switches
    pub async fn is_empty(&self) -> bool {
        self.switches.read().await.is_empty()
    }
}
