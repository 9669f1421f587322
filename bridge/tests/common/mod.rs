//! Shared test doubles and fixtures

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use skybridge::auth::configurator::{ConfigRequest, Configurator, PromptHandle};
use skybridge::auth::store::TokenStore;
use skybridge::auth::tokens::TokenPair;
use skybridge::errors::BridgeError;
use skybridge::session::Session;
use skydrop_client::{Controller, Zone};

/// Ordered record of calls across the session and the store
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events_snapshot(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

// ================================= SESSION ===================================== //

/// Scripted in-memory session
pub struct MockSession {
    tokens: Mutex<TokenPair>,
    expired: AtomicBool,
    controllers: Mutex<Vec<Controller>>,
    good_codes: Mutex<HashMap<String, TokenPair>>,
    fail_refresh: AtomicBool,
    fail_update: AtomicBool,
    fail_actions: AtomicBool,
    refresh_count: AtomicU32,
    events: EventLog,
}

impl MockSession {
    pub fn new(events: EventLog) -> Self {
        Self {
            tokens: Mutex::new(TokenPair::default()),
            expired: AtomicBool::new(false),
            controllers: Mutex::new(Vec::new()),
            good_codes: Mutex::new(HashMap::new()),
            fail_refresh: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_actions: AtomicBool::new(false),
            refresh_count: AtomicU32::new(0),
            events,
        }
    }

    pub fn with_tokens(self, pair: TokenPair) -> Self {
        *self.tokens.lock().unwrap() = pair;
        self
    }

    /// Mark the access token as expired or fresh
    pub fn set_expired(&self, expired: bool) {
        self.expired.store(expired, Ordering::SeqCst);
    }

    /// Make every refresh attempt fail
    pub fn set_fail_refresh(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    /// Make every controller fetch fail
    pub fn set_fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    /// Make every toggle action fail
    pub fn set_fail_actions(&self, fail: bool) {
        self.fail_actions.store(fail, Ordering::SeqCst);
    }

    /// Install the controller snapshot served to callers
    pub fn set_controllers(&self, controllers: Vec<Controller>) {
        *self.controllers.lock().unwrap() = controllers;
    }

    /// Register a grant code the exchange accepts
    pub fn accept_code(&self, code: &str, pair: TokenPair) {
        self.good_codes.lock().unwrap().insert(code.to_string(), pair);
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    fn check_action(&self, event: String) -> Result<(), BridgeError> {
        self.record(event);
        if self.fail_actions.load(Ordering::SeqCst) {
            return Err(BridgeError::AuthError("action rejected".to_string()));
        }
        Ok(())
    }

    fn patch_zone(&self, controller_id: &str, zone_id: &str, patch: impl FnOnce(&mut Zone)) {
        let mut controllers = self.controllers.lock().unwrap();
        if let Some(controller) = controllers.iter_mut().find(|c| c.id == controller_id) {
            if let Some(zone) = controller.zones.iter_mut().find(|z| z.id == zone_id) {
                patch(zone);
            }
        }
    }
}

#[async_trait]
impl Session for MockSession {
    async fn load_token_data(&self, pair: &TokenPair) {
        *self.tokens.lock().unwrap() = pair.clone();
    }

    async fn token_data(&self) -> TokenPair {
        self.tokens.lock().unwrap().clone()
    }

    async fn is_token_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    async fn get_access_token(&self, code: &str) -> Result<TokenPair, BridgeError> {
        self.record(format!("exchange:{}", code));
        let accepted = self.good_codes.lock().unwrap().get(code).cloned();
        match accepted {
            Some(pair) => {
                *self.tokens.lock().unwrap() = pair.clone();
                self.expired.store(false, Ordering::SeqCst);
                Ok(pair)
            }
            None => Err(BridgeError::AuthError("invalid grant code".to_string())),
        }
    }

    async fn refresh_access_token(&self) -> Result<TokenPair, BridgeError> {
        self.record("refresh");
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(BridgeError::AuthError("refresh rejected".to_string()));
        }

        let n = self.refresh_count.fetch_add(1, Ordering::SeqCst) + 1;
        let fresh = TokenPair::new(format!("at-r{}", n), format!("rt-r{}", n));
        *self.tokens.lock().unwrap() = fresh.clone();
        self.expired.store(false, Ordering::SeqCst);
        Ok(fresh)
    }

    async fn update_controllers(&self) -> Result<(), BridgeError> {
        self.record("fetch");
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(BridgeError::AuthError("fetch rejected".to_string()));
        }
        Ok(())
    }

    async fn controllers(&self) -> Vec<Controller> {
        self.controllers.lock().unwrap().clone()
    }

    async fn controller(&self, id: &str) -> Option<Controller> {
        self.controllers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    async fn zone(&self, controller_id: &str, zone_id: &str) -> Option<Zone> {
        self.controllers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == controller_id)
            .and_then(|c| c.zone(zone_id))
            .cloned()
    }

    async fn enable_controller(&self, id: &str) -> Result<(), BridgeError> {
        self.check_action(format!("enable_controller:{}", id))?;
        let mut controllers = self.controllers.lock().unwrap();
        if let Some(controller) = controllers.iter_mut().find(|c| c.id == id) {
            controller.enabled = true;
        }
        Ok(())
    }

    async fn disable_controller(&self, id: &str) -> Result<(), BridgeError> {
        self.check_action(format!("disable_controller:{}", id))?;
        let mut controllers = self.controllers.lock().unwrap();
        if let Some(controller) = controllers.iter_mut().find(|c| c.id == id) {
            controller.enabled = false;
        }
        Ok(())
    }

    async fn enable_zone(&self, controller_id: &str, zone_id: &str) -> Result<(), BridgeError> {
        self.check_action(format!("enable_zone:{}:{}", controller_id, zone_id))?;
        self.patch_zone(controller_id, zone_id, |zone| zone.enabled = true);
        Ok(())
    }

    async fn disable_zone(&self, controller_id: &str, zone_id: &str) -> Result<(), BridgeError> {
        self.check_action(format!("disable_zone:{}:{}", controller_id, zone_id))?;
        self.patch_zone(controller_id, zone_id, |zone| zone.enabled = false);
        Ok(())
    }

    async fn start_watering(
        &self,
        controller_id: &str,
        zone_id: &str,
    ) -> Result<(), BridgeError> {
        self.check_action(format!("start_watering:{}:{}", controller_id, zone_id))?;
        self.patch_zone(controller_id, zone_id, |zone| zone.watering = true);
        Ok(())
    }

    async fn stop_watering(&self, controller_id: &str, zone_id: &str) -> Result<(), BridgeError> {
        self.check_action(format!("stop_watering:{}:{}", controller_id, zone_id))?;
        self.patch_zone(controller_id, zone_id, |zone| zone.watering = false);
        Ok(())
    }
}

// ================================== STORE ====================================== //

/// In-memory token store with optional save failure
pub struct MemoryTokenStore {
    saved: Mutex<Option<TokenPair>>,
    fail_save: AtomicBool,
    events: EventLog,
}

impl MemoryTokenStore {
    pub fn new(events: EventLog) -> Self {
        Self {
            saved: Mutex::new(None),
            fail_save: AtomicBool::new(false),
            events,
        }
    }

    pub fn with_saved(self, pair: TokenPair) -> Self {
        *self.saved.lock().unwrap() = Some(pair);
        self
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Option<TokenPair> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<TokenPair>, BridgeError> {
        Ok(self.saved.lock().unwrap().clone())
    }

    async fn save(&self, pair: &TokenPair) -> Result<(), BridgeError> {
        self.events.lock().unwrap().push("persist".to_string());
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(BridgeError::StorageError("disk full".to_string()));
        }
        *self.saved.lock().unwrap() = Some(pair.clone());
        Ok(())
    }
}

// =============================== CONFIGURATOR ================================== //

/// Prompt surface that records every open and retire
pub struct MockConfigurator {
    active: Mutex<Vec<PromptHandle>>,
    opened: AtomicUsize,
    max_active_seen: AtomicUsize,
}

impl MockConfigurator {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(Vec::new()),
            opened: AtomicUsize::new(0),
            max_active_seen: AtomicUsize::new(0),
        }
    }

    /// Prompts currently open
    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    /// Prompts opened over the whole run
    pub fn opened_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Most prompts ever open at the same time
    pub fn max_active_seen(&self) -> usize {
        self.max_active_seen.load(Ordering::SeqCst)
    }
}

impl Default for MockConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Configurator for MockConfigurator {
    async fn request_config(&self, _request: ConfigRequest) -> Result<PromptHandle, BridgeError> {
        let handle = PromptHandle::new();
        let mut active = self.active.lock().unwrap();
        active.push(handle);
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.max_active_seen.fetch_max(active.len(), Ordering::SeqCst);
        Ok(handle)
    }

    async fn request_done(&self, handle: PromptHandle) -> Result<(), BridgeError> {
        self.active.lock().unwrap().retain(|h| *h != handle);
        Ok(())
    }
}

// ================================= FIXTURES ==================================== //

/// One controller with a wired zone ("1" Roses) and a not-wired zone ("2" Spare)
pub fn controller_fixture() -> Controller {
    serde_json::from_value(json!({
        "id": "ctl-1",
        "short_id": "6f3a9c",
        "name": "Front Yard",
        "enabled": true,
        "zones": [
            {
                "id": "1",
                "name": "Roses",
                "status": "wired",
                "enabled": true,
                "watering": false,
                "state": {"soil_moisture": 41}
            },
            {
                "id": "2",
                "name": "Spare",
                "status": "not_wired",
                "enabled": false,
                "watering": false
            }
        ],
        "location": "backyard-hub"
    }))
    .unwrap()
}
