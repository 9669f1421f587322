//! Toggle switch entities
//!
//! Projects each controller into an enable switch and each wired zone into
//! an enabled switch plus a watering switch. A single entity struct tagged
//! by [`ToggleKind`] covers all three, behind the [`Switch`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use skydrop_client::{Controller, Zone, ZoneStatus};

use crate::errors::BridgeError;
use crate::session::Session;

/// Integration domain, prefixed onto every unique ID
pub const DOMAIN: &str = "skydrop";

/// Manufacturer reported in the device info of every switch
pub const MANUFACTURER: &str = "Skydrop";

/// Which aspect of the hardware a switch toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleKind {
    /// Controller-wide enable/disable
    ControllerEnabled,
    /// Zone participation in the watering schedule
    ZoneEnabled,
    /// Zone watering activity
    ZoneWatering,
}

/// Device registry view of the controller backing a switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
}

/// Common surface of every projected switch
#[async_trait]
pub trait Switch: Send + Sync {
    /// Stable unique ID
    fn unique_id(&self) -> String;

    /// Display name
    fn name(&self) -> String;

    /// Icon for the current state
    fn icon(&self) -> &'static str;

    /// Rendered on/off state
    fn is_on(&self) -> bool;

    /// Raw attribute bag backing the rendered state
    fn attributes(&self) -> &Map<String, Value>;

    /// Device the switch belongs to
    fn device_info(&self) -> DeviceInfo;

    /// Re-read backing state after an update signal
    async fn handle_signal(&mut self);

    /// Turn the switch on
    async fn turn_on(&mut self) -> Result<(), BridgeError>;

    /// Turn the switch off
    async fn turn_off(&mut self) -> Result<(), BridgeError>;
}

/// A projected toggle switch, tagged by what it controls
pub struct SwitchEntity {
    session: Arc<dyn Session>,
    kind: ToggleKind,
    controller_id: String,
    controller_short_id: String,
    controller_name: String,
    zone_id: Option<String>,
    zone_name: Option<String>,
    state: bool,
    attributes: Map<String, Value>,
}

impl SwitchEntity {
    /// Switch toggling the controller's enabled flag
    pub fn controller_enabled(session: Arc<dyn Session>, controller: &Controller) -> Self {
        let mut entity = Self {
            session,
            kind: ToggleKind::ControllerEnabled,
            controller_id: controller.id.clone(),
            controller_short_id: controller.short_id.clone(),
            controller_name: controller.name.clone(),
            zone_id: None,
            zone_name: None,
            state: false,
            attributes: Map::new(),
        };
        entity.apply_controller(controller);
        entity
    }

    /// Switch toggling a zone's schedule participation
    pub fn zone_enabled(
        session: Arc<dyn Session>,
        controller: &Controller,
        zone: &Zone,
    ) -> Self {
        Self::for_zone(session, ToggleKind::ZoneEnabled, controller, zone)
    }

    /// Switch toggling a zone's watering activity
    pub fn zone_watering(
        session: Arc<dyn Session>,
        controller: &Controller,
        zone: &Zone,
    ) -> Self {
        Self::for_zone(session, ToggleKind::ZoneWatering, controller, zone)
    }

    fn for_zone(
        session: Arc<dyn Session>,
        kind: ToggleKind,
        controller: &Controller,
        zone: &Zone,
    ) -> Self {
        let mut entity = Self {
            session,
            kind,
            controller_id: controller.id.clone(),
            controller_short_id: controller.short_id.clone(),
            controller_name: controller.name.clone(),
            zone_id: Some(zone.id.clone()),
            zone_name: Some(zone.name.clone()),
            state: false,
            attributes: Map::new(),
        };
        entity.apply_zone(zone);
        entity
    }

    /// The tag identifying what this switch controls
    pub fn kind(&self) -> ToggleKind {
        self.kind
    }

    fn apply_controller(&mut self, controller: &Controller) {
        self.controller_name = controller.name.clone();
        self.state = controller.enabled;
        self.attributes.extend(controller.data.clone());
    }

    fn apply_zone(&mut self, zone: &Zone) {
        self.zone_name = Some(zone.name.clone());
        self.state = match self.kind {
            ToggleKind::ZoneWatering => zone.watering,
            _ => zone.enabled,
        };
        self.attributes.extend(zone.data.clone());
        self.attributes.extend(zone.state.clone());
    }

    fn require_zone_id(&self) -> Result<&str, BridgeError> {
        self.zone_id
            .as_deref()
            .ok_or_else(|| BridgeError::Internal("zone switch is missing its zone id".to_string()))
    }
}

#[async_trait]
impl Switch for SwitchEntity {
    fn unique_id(&self) -> String {
        match self.kind {
            ToggleKind::ControllerEnabled => {
                format!("{}_{}_enabled", DOMAIN, self.controller_short_id)
            }
            ToggleKind::ZoneEnabled => format!(
                "{}_{}_zone_{}_enabled",
                DOMAIN,
                self.controller_short_id,
                self.zone_id.as_deref().unwrap_or_default()
            ),
            ToggleKind::ZoneWatering => format!(
                "{}_{}_zone_{}_watering",
                DOMAIN,
                self.controller_short_id,
                self.zone_id.as_deref().unwrap_or_default()
            ),
        }
    }

    fn name(&self) -> String {
        let zone_name = self.zone_name.as_deref().unwrap_or_default();
        match self.kind {
            ToggleKind::ControllerEnabled => {
                format!("{} Controller Enabled", self.controller_name)
            }
            ToggleKind::ZoneEnabled => format!("{} Enabled", zone_name),
            ToggleKind::ZoneWatering => format!("{} Watering", zone_name),
        }
    }

    fn icon(&self) -> &'static str {
        match self.kind {
            // The watering switch keeps its icon regardless of state
            ToggleKind::ZoneWatering => "mdi:sprinkler",
            _ => {
                if self.state {
                    "mdi:water"
                } else {
                    "mdi:water-off"
                }
            }
        }
    }

    fn is_on(&self) -> bool {
        self.state
    }

    fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifier: self.controller_id.clone(),
            name: self.controller_name.clone(),
            manufacturer: MANUFACTURER,
        }
    }

    async fn handle_signal(&mut self) {
        match self.kind {
            ToggleKind::ControllerEnabled => {
                match self.session.controller(&self.controller_id).await {
                    Some(controller) => self.apply_controller(&controller),
                    None => debug!(
                        "Controller {} missing from the latest update, keeping last state",
                        self.controller_id
                    ),
                }
            }
            ToggleKind::ZoneEnabled | ToggleKind::ZoneWatering => {
                let Some(zone_id) = self.zone_id.clone() else {
                    return;
                };
                match self.session.zone(&self.controller_id, &zone_id).await {
                    Some(zone) => self.apply_zone(&zone),
                    None => debug!(
                        "Zone {} missing from the latest update, keeping last state",
                        zone_id
                    ),
                }
            }
        }
    }

    async fn turn_on(&mut self) -> Result<(), BridgeError> {
        match self.kind {
            ToggleKind::ControllerEnabled => {
                self.session.enable_controller(&self.controller_id).await?;
            }
            ToggleKind::ZoneEnabled => {
                let zone_id = self.require_zone_id()?.to_string();
                self.session.enable_zone(&self.controller_id, &zone_id).await?;
            }
            ToggleKind::ZoneWatering => {
                let zone_id = self.require_zone_id()?.to_string();
                self.session.start_watering(&self.controller_id, &zone_id).await?;
            }
        }

        // Read back right away instead of waiting for the next poll
        self.handle_signal().await;
        Ok(())
    }

    async fn turn_off(&mut self) -> Result<(), BridgeError> {
        match self.kind {
            ToggleKind::ControllerEnabled => {
                self.session.disable_controller(&self.controller_id).await?;
            }
            ToggleKind::ZoneEnabled => {
                let zone_id = self.require_zone_id()?.to_string();
                self.session.disable_zone(&self.controller_id, &zone_id).await?;
            }
            ToggleKind::ZoneWatering => {
                let zone_id = self.require_zone_id()?.to_string();
                self.session.stop_watering(&self.controller_id, &zone_id).await?;
            }
        }

        self.handle_signal().await;
        Ok(())
    }
}

/// Project every controller and wired zone into toggle switches.
///
/// Zones that are not wired get no switches at all.
pub fn project_switches(
    session: &Arc<dyn Session>,
    controllers: &[Controller],
) -> Vec<SwitchEntity> {
    let mut switches = Vec::new();
    for controller in controllers {
        switches.push(SwitchEntity::controller_enabled(session.clone(), controller));
        for zone in &controller.zones {
            if zone.status == ZoneStatus::Wired {
                switches.push(SwitchEntity::zone_enabled(session.clone(), controller, zone));
                switches.push(SwitchEntity::zone_watering(session.clone(), controller, zone));
            }
        }
    }
    switches
}
