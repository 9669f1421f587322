//! Skydrop API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OAuth token state held by the client
///
/// Tokens restored from persistence carry no expiry information; an absent
/// `expires_at` is treated as already expired so the next update cycle
/// refreshes the pair before making API calls.
#[derive(Debug, Clone, Default)]
pub struct TokenData {
    /// Bearer access token
    pub access_token: String,

    /// Refresh token used to obtain a new access token
    pub refresh_token: String,

    /// Instant after which the access token is no longer valid
    pub expires_at: Option<DateTime<Utc>>,
}

/// Wire response from the OAuth token endpoint
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Zone wiring status as reported by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    Wired,
    NotWired,
    #[serde(other)]
    Unknown,
}

/// A watering zone attached to a controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    /// Zone ID, unique within its controller
    pub id: String,

    /// Display name
    pub name: String,

    /// Wiring status; only wired zones are operable
    pub status: ZoneStatus,

    /// Whether the zone participates in watering schedules
    #[serde(default)]
    pub enabled: bool,

    /// Whether the zone is currently watering
    #[serde(default)]
    pub watering: bool,

    /// Live state reported by the controller (moisture, schedule, ...)
    #[serde(default)]
    pub state: Map<String, Value>,

    /// Remaining zone configuration fields
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// An irrigation controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Controller {
    /// Controller ID
    pub id: String,

    /// Short ID used in display and entity naming
    pub short_id: String,

    /// Display name
    pub name: String,

    /// Whether the controller is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Zones wired to this controller
    #[serde(default)]
    pub zones: Vec<Zone>,

    /// Remaining controller status fields
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Controller {
    /// Look up a zone by ID
    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == zone_id)
    }
}

/// Wire response from the controllers listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ControllersResponse {
    pub controllers: Vec<Controller>,
}
