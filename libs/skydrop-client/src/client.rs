//! Skydrop cloud API client implementation

use std::time::Duration;

use chrono::Utc;
use reqwest::{header, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use url::Url;

use crate::error::Error;
use crate::models::{Controller, ControllersResponse, TokenData, TokenResponse, Zone};

/// Safety margin subtracted from the reported token lifetime, in seconds
const EXPIRY_SKEW_SECS: i64 = 60;

/// Request timeout for all API calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Skydrop sprinkler cloud API
///
/// Owns the OAuth token state and the in-memory controller list. Token
/// exchange and refresh replace the token state wholesale;
/// [`update_controllers`](SkydropClient::update_controllers) replaces the
/// controller list wholesale. Action calls patch the cached model on success
/// so callers see the new state without waiting for the next update.
pub struct SkydropClient {
    http: Client,
    base_url: Url,
    client_key: String,
    client_secret: SecretString,
    tokens: RwLock<TokenData>,
    controllers: RwLock<Vec<Controller>>,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    client_id: &'a str,
    client_secret: &'a str,
}

impl SkydropClient {
    /// Create a new client
    pub fn new(
        base_url: Url,
        client_key: impl Into<String>,
        client_secret: SecretString,
    ) -> Result<Self, Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(http, base_url, client_key.into(), client_secret))
    }

    /// Create a client with a caller-supplied `reqwest` client
    pub fn with_client(
        http: Client,
        base_url: Url,
        client_key: String,
        client_secret: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            client_key,
            client_secret,
            tokens: RwLock::new(TokenData::default()),
            controllers: RwLock::new(Vec::new()),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Token state ──────────────────────────────────────────────────

    /// Seed token state from persisted credentials
    ///
    /// Restored tokens carry no expiry information and report expired until
    /// the first refresh.
    pub async fn load_token_data(&self, access: &str, refresh: &str) {
        let mut tokens = self.tokens.write().await;
        *tokens = TokenData {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_at: None,
        };
    }

    /// Snapshot of the current token state
    pub async fn token_data(&self) -> TokenData {
        self.tokens.read().await.clone()
    }

    /// Whether the access token is expired (or of unknown age)
    pub async fn is_token_expired(&self) -> bool {
        let tokens = self.tokens.read().await;
        match tokens.expires_at {
            Some(at) => Utc::now() + chrono::Duration::seconds(EXPIRY_SKEW_SECS) >= at,
            None => true,
        }
    }

    /// Exchange a one-time grant code for a token pair
    ///
    /// Fails with [`Error::Authentication`] on an invalid or expired code.
    pub async fn get_access_token(&self, code: &str) -> Result<TokenData, Error> {
        debug!("Exchanging grant code for access token");
        let request = TokenRequest {
            grant_type: "authorization_code",
            code: Some(code),
            refresh_token: None,
            client_id: &self.client_key,
            client_secret: self.client_secret.expose_secret(),
        };
        self.token_call(&request).await
    }

    /// Exchange the refresh token for a fresh token pair
    ///
    /// Fails with [`Error::Authentication`] on a revoked refresh token.
    pub async fn refresh_access_token(&self) -> Result<TokenData, Error> {
        let refresh_token = self.tokens.read().await.refresh_token.clone();
        if refresh_token.is_empty() {
            return Err(Error::Token("no refresh token loaded".to_string()));
        }

        debug!("Refreshing access token");
        let request = TokenRequest {
            grant_type: "refresh_token",
            code: None,
            refresh_token: Some(&refresh_token),
            client_id: &self.client_key,
            client_secret: self.client_secret.expose_secret(),
        };
        self.token_call(&request).await
    }

    async fn token_call(&self, request: &TokenRequest<'_>) -> Result<TokenData, Error> {
        let url = self.endpoint("/oauth/token")?;
        let response = self.http.post(url).form(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token request failed: {} - {}", status, body);
            return Err(Error::Authentication(format!("{}: {}", status, body)));
        }

        let granted: TokenResponse = response.json().await?;
        let data = TokenData {
            access_token: granted.access_token,
            refresh_token: granted.refresh_token,
            expires_at: Some(Utc::now() + chrono::Duration::seconds(granted.expires_in)),
        };

        let mut tokens = self.tokens.write().await;
        *tokens = data.clone();
        info!("Token pair replaced, expires at: {:?}", data.expires_at);

        Ok(data)
    }

    async fn bearer(&self) -> Result<String, Error> {
        let tokens = self.tokens.read().await;
        if tokens.access_token.is_empty() {
            return Err(Error::Token("no access token loaded".to_string()));
        }
        Ok(tokens.access_token.clone())
    }

    // ── Controller state ─────────────────────────────────────────────

    /// Fetch all controllers (with nested zones) into the in-memory model
    pub async fn update_controllers(&self) -> Result<(), Error> {
        let token = self.bearer().await?;
        let url = self.endpoint("/api/v1/controllers")?;
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;
        let response = check_status(response, "Controller fetch").await?;

        let listing: ControllersResponse = response.json().await?;
        let count = listing.controllers.len();

        let mut controllers = self.controllers.write().await;
        *controllers = listing.controllers;
        debug!("Updated state for {} controller(s)", count);

        Ok(())
    }

    /// Snapshot of all known controllers
    pub async fn controllers(&self) -> Vec<Controller> {
        self.controllers.read().await.clone()
    }

    /// Snapshot of a single controller
    pub async fn controller(&self, id: &str) -> Option<Controller> {
        self.controllers.read().await.iter().find(|c| c.id == id).cloned()
    }

    /// Snapshot of a single zone
    pub async fn zone(&self, controller_id: &str, zone_id: &str) -> Option<Zone> {
        self.controllers
            .read()
            .await
            .iter()
            .find(|c| c.id == controller_id)
            .and_then(|c| c.zone(zone_id))
            .cloned()
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Enable a controller
    pub async fn enable_controller(&self, id: &str) -> Result<(), Error> {
        self.set_controller_enabled(id, true).await
    }

    /// Disable a controller
    pub async fn disable_controller(&self, id: &str) -> Result<(), Error> {
        self.set_controller_enabled(id, false).await
    }

    async fn set_controller_enabled(&self, id: &str, enabled: bool) -> Result<(), Error> {
        let action = if enabled { "enable" } else { "disable" };
        let path = format!("/api/v1/controllers/{}/{}", id, action);
        self.put_action(&path).await?;

        let mut controllers = self.controllers.write().await;
        if let Some(controller) = controllers.iter_mut().find(|c| c.id == id) {
            controller.enabled = enabled;
        }
        Ok(())
    }

    /// Enable a zone
    pub async fn enable_zone(&self, controller_id: &str, zone_id: &str) -> Result<(), Error> {
        self.set_zone_enabled(controller_id, zone_id, true).await
    }

    /// Disable a zone
    pub async fn disable_zone(&self, controller_id: &str, zone_id: &str) -> Result<(), Error> {
        self.set_zone_enabled(controller_id, zone_id, false).await
    }

    async fn set_zone_enabled(
        &self,
        controller_id: &str,
        zone_id: &str,
        enabled: bool,
    ) -> Result<(), Error> {
        let action = if enabled { "enable" } else { "disable" };
        let path = format!(
            "/api/v1/controllers/{}/zones/{}/{}",
            controller_id, zone_id, action
        );
        self.put_action(&path).await?;

        self.patch_zone(controller_id, zone_id, |zone| zone.enabled = enabled)
            .await;
        Ok(())
    }

    /// Start watering a zone for its configured runtime
    pub async fn start_watering(&self, controller_id: &str, zone_id: &str) -> Result<(), Error> {
        let path = format!(
            "/api/v1/controllers/{}/zones/{}/water/start",
            controller_id, zone_id
        );
        self.post_action(&path).await?;

        self.patch_zone(controller_id, zone_id, |zone| zone.watering = true)
            .await;
        Ok(())
    }

    /// Stop watering a zone
    pub async fn stop_watering(&self, controller_id: &str, zone_id: &str) -> Result<(), Error> {
        let path = format!(
            "/api/v1/controllers/{}/zones/{}/water/stop",
            controller_id, zone_id
        );
        self.post_action(&path).await?;

        self.patch_zone(controller_id, zone_id, |zone| zone.watering = false)
            .await;
        Ok(())
    }

    async fn put_action(&self, path: &str) -> Result<(), Error> {
        let token = self.bearer().await?;
        let url = self.endpoint(path)?;
        debug!("PUT {}", url);

        let response = self
            .http
            .put(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;
        check_status(response, "Action").await?;
        Ok(())
    }

    async fn post_action(&self, path: &str) -> Result<(), Error> {
        let token = self.bearer().await?;
        let url = self.endpoint(path)?;
        debug!("POST {}", url);

        let response = self
            .http
            .post(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;
        check_status(response, "Action").await?;
        Ok(())
    }

    async fn patch_zone<F>(&self, controller_id: &str, zone_id: &str, patch: F)
    where
        F: FnOnce(&mut Zone),
    {
        let mut controllers = self.controllers.write().await;
        if let Some(zone) = controllers
            .iter_mut()
            .find(|c| c.id == controller_id)
            .and_then(|c| c.zones.iter_mut().find(|z| z.id == zone_id))
        {
            patch(zone);
        }
    }
}

async fn check_status(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("{} failed: {} - {}", context, status, body);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::Authentication(format!("{}: {}", status, body)));
    }
    Err(Error::Api {
        status: status.as_u16(),
        message: body,
    })
}
