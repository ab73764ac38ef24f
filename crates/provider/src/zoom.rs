//! License actuator backed by the Zoom REST API.
//!
//! Uses server-to-server OAuth (account credentials) for a bearer token, then
//! switches a user's type between licensed and basic.
//!
//! ```ignore
//! let actuator = ZoomActuator::new(&config.license, client_secret);
//! actuator.grant(&"a@uni.edu".into()).await?;
//! ```

use crate::{Actuation, LicenseActuator};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use seatsync_core::config::LicenseConfig;
use seatsync_core::error::{SyncError, SyncResult};
use seatsync_core::{Action, UserId};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

/// Refresh this long before the provider-reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Used when the token response carries no `expires_in`.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

pub struct ZoomActuator {
    account_id: String,
    client_id: String,
    client_secret: String,
    auth_url: Url,
    api_base_url: Url,
    licensed_type: u8,
    basic_type: u8,
    client: Client,
    token: Mutex<Option<CachedToken>>,
}

impl ZoomActuator {
    pub fn new(config: &LicenseConfig, client_secret: impl Into<String>) -> Self {
        Self {
            account_id: config.account_id.clone(),
            client_id: config.client_id.clone(),
            client_secret: client_secret.into(),
            auth_url: config.auth_url.clone(),
            api_base_url: config.api_base_url.clone(),
            licensed_type: config.licensed_type,
            basic_type: config.basic_type,
            client: Client::new(),
            token: Mutex::new(None),
        }
    }

    /// Cached bearer token, exchanged for a fresh one near expiry.
    async fn access_token(&self) -> SyncResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!(auth_url = %self.auth_url, "requesting access token");

        let resp = self
            .client
            .post(self.auth_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "account_credentials"),
                ("account_id", self.account_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SyncError::Actuator(format!("Token request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Actuator(format!(
                "Token request rejected: HTTP {} {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| SyncError::Actuator(format!("Malformed token response: {e}")))?;

        let ttl = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);
        let refresh_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_MARGIN);

        tracing::info!(expires_in_s = ttl.as_secs(), "access token acquired");

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at,
        });
        Ok(token.access_token)
    }

    fn user_url(&self, user: &UserId) -> SyncResult<Url> {
        let mut url = self.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SyncError::InvalidInput(format!("API base URL {} cannot be a base", self.api_base_url))
            })?
            .pop_if_empty()
            .push("users")
            .push(user.as_str());
        Ok(url)
    }

    async fn set_user_type(&self, user: &UserId, action: Action) -> SyncResult<Actuation> {
        let user_type = match action {
            Action::Grant => self.licensed_type,
            Action::Revoke => self.basic_type,
        };
        let url = self.user_url(user)?;
        let token = self.access_token().await?;

        tracing::debug!(user = %user, %action, user_type, "updating user type");

        let resp = self
            .client
            .patch(url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "type": user_type }))
            .send()
            .await
            .map_err(|e| SyncError::Actuator(format!("{action} request for {user} failed: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Actuation::Applied);
        }

        if status == StatusCode::UNAUTHORIZED {
            // Force a fresh exchange for the next user.
            *self.token.lock().await = None;
        }

        let body = resp.text().await.unwrap_or_default();
        let reason = format!("HTTP {}: {}", status.as_u16(), body.trim());
        tracing::warn!(user = %user, %action, %reason, "license pool rejected request");
        Ok(Actuation::Rejected { reason })
    }
}

#[async_trait]
impl LicenseActuator for ZoomActuator {
    async fn grant(&self, user: &UserId) -> SyncResult<Actuation> {
        self.set_user_type(user, Action::Grant).await
    }

    async fn revoke(&self, user: &UserId) -> SyncResult<Actuation> {
        self.set_user_type(user, Action::Revoke).await
    }
}
