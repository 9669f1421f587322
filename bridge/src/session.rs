//! API session seam
//!
//! Every component talks to the Skydrop cloud through this trait so the
//! login flow, the updater and the switch entities can run against a mock
//! session in tests. The production implementation is [`SkydropClient`].

use async_trait::async_trait;

use skydrop_client::{Controller, SkydropClient, Zone};

use crate::auth::tokens::TokenPair;
use crate::errors::BridgeError;

/// Authenticated Skydrop API session shared by every component
#[async_trait]
pub trait Session: Send + Sync {
    /// Seed token state from persisted credentials
    async fn load_token_data(&self, pair: &TokenPair);

    /// Current access/refresh pair held by the session
    async fn token_data(&self) -> TokenPair;

    /// Whether the access token needs a refresh before API calls
    async fn is_token_expired(&self) -> bool;

    /// Exchange a one-time grant code for a new token pair
    async fn get_access_token(&self, code: &str) -> Result<TokenPair, BridgeError>;

    /// Exchange the refresh token for a new token pair
    async fn refresh_access_token(&self) -> Result<TokenPair, BridgeError>;

    /// Re-fetch the controller and zone state from the cloud
    async fn update_controllers(&self) -> Result<(), BridgeError>;

    /// Snapshot of all known controllers
    async fn controllers(&self) -> Vec<Controller>;

    /// Snapshot of a single controller
    async fn controller(&self, id: &str) -> Option<Controller>;

    /// Snapshot of a single zone
    async fn zone(&self, controller_id: &str, zone_id: &str) -> Option<Zone>;

    /// Enable a controller
    async fn enable_controller(&self, id: &str) -> Result<(), BridgeError>;

    /// Disable a controller
    async fn disable_controller(&self, id: &str) -> Result<(), BridgeError>;

    /// Include a zone in the watering schedule
    async fn enable_zone(&self, controller_id: &str, zone_id: &str) -> Result<(), BridgeError>;

    /// Exclude a zone from the watering schedule
    async fn disable_zone(&self, controller_id: &str, zone_id: &str) -> Result<(), BridgeError>;

    /// Start watering a zone
    async fn start_watering(&self, controller_id: &str, zone_id: &str)
        -> Result<(), BridgeError>;

    /// Stop watering a zone
    async fn stop_watering(&self, controller_id: &str, zone_id: &str) -> Result<(), BridgeError>;
}

#[async_trait]
impl Session for SkydropClient {
    async fn load_token_data(&self, pair: &TokenPair) {
        SkydropClient::load_token_data(self, &pair.access, &pair.refresh).await;
    }

    async fn token_data(&self) -> TokenPair {
        let data = SkydropClient::token_data(self).await;
        TokenPair::new(data.access_token, data.refresh_token)
    }

    async fn is_token_expired(&self) -> bool {
        SkydropClient::is_token_expired(self).await
    }

    async fn get_access_token(&self, code: &str) -> Result<TokenPair, BridgeError> {
        let data = SkydropClient::get_access_token(self, code).await?;
        Ok(TokenPair::new(data.access_token, data.refresh_token))
    }

    async fn refresh_access_token(&self) -> Result<TokenPair, BridgeError> {
        let data = SkydropClient::refresh_access_token(self).await?;
        Ok(TokenPair::new(data.access_token, data.refresh_token))
    }

    async fn update_controllers(&self) -> Result<(), BridgeError> {
        SkydropClient::update_controllers(self).await?;
        Ok(())
    }

    async fn controllers(&self) -> Vec<Controller> {
        SkydropClient::controllers(self).await
    }

    async fn controller(&self, id: &str) -> Option<Controller> {
        SkydropClient::controller(self, id).await
    }

    async fn zone(&self, controller_id: &str, zone_id: &str) -> Option<Zone> {
        SkydropClient::zone(self, controller_id, zone_id).await
    }

    async fn enable_controller(&self, id: &str) -> Result<(), BridgeError> {
        SkydropClient::enable_controller(self, id).await?;
        Ok(())
    }

    async fn disable_controller(&self, id: &str) -> Result<(), BridgeError> {
        SkydropClient::disable_controller(self, id).await?;
        Ok(())
    }

    async fn enable_zone(&self, controller_id: &str, zone_id: &str) -> Result<(), BridgeError> {
        SkydropClient::enable_zone(self, controller_id, zone_id).await?;
        Ok(())
    }

    async fn disable_zone(&self, controller_id: &str, zone_id: &str) -> Result<(), BridgeError> {
        SkydropClient::disable_zone(self, controller_id, zone_id).await?;
        Ok(())
    }

    async fn start_watering(
        &self,
        controller_id: &str,
        zone_id: &str,
    ) -> Result<(), BridgeError> {
        SkydropClient::start_watering(self, controller_id, zone_id).await?;
        Ok(())
    }

    async fn stop_watering(&self, controller_id: &str, zone_id: &str) -> Result<(), BridgeError> {
        SkydropClient::stop_watering(self, controller_id, zone_id).await?;
        Ok(())
    }
}
