//! Run configuration, loaded once at startup and passed around by value.
//!
//! `exempt_users` is required: a config without it is rejected at load time,
//! while an explicit `[]` means nobody is exempt.

use crate::error::{SyncError, SyncResult};
use crate::types::ExemptSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const DEFAULT_AUTH_URL: &str = "https://zoom.us/oauth/token";
const DEFAULT_API_BASE_URL: &str = "https://api.zoom.us/v2";
const DEFAULT_TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

/// Zoom user type for a paid seat.
const LICENSED_USER_TYPE: u8 = 2;
/// Zoom user type for the free tier.
const BASIC_USER_TYPE: u8 = 1;

fn default_auth_url() -> Url {
    Url::parse(DEFAULT_AUTH_URL).expect("default auth url is valid")
}

fn default_api_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE_URL).expect("default api url is valid")
}

fn default_telegram_api_base_url() -> Url {
    Url::parse(DEFAULT_TELEGRAM_API_BASE_URL).expect("default telegram url is valid")
}

fn default_licensed_type() -> u8 {
    LICENSED_USER_TYPE
}

fn default_basic_type() -> u8 {
    BASIC_USER_TYPE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Schedule file consumed by the roster provider.
    pub schedule_path: PathBuf,
    pub exempt_users: ExemptSet,
    pub license: LicenseConfig,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

/// License pool account settings. The client secret is not stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    pub account_id: String,
    pub client_id: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: Url,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: Url,
    #[serde(default = "default_licensed_type")]
    pub licensed_type: u8,
    #[serde(default = "default_basic_type")]
    pub basic_type: u8,
}

/// Notification chat settings. The bot token is not stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub chat_id: String,
    #[serde(default = "default_telegram_api_base_url")]
    pub api_base_url: Url,
}

impl SyncConfig {
    /// Parse and validate a config document.
    pub fn from_json_str(raw: &str) -> SyncResult<Self> {
        let config: SyncConfig = serde_json::from_str(raw)
            .map_err(|e| SyncError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. A relative `schedule_path` is resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let mut config = Self::from_json_str(&raw)?;

        if config.schedule_path.is_relative() {
            if let Some(dir) = path.parent() {
                config.schedule_path = dir.join(&config.schedule_path);
            }
        }

        Ok(config)
    }

    fn validate(&self) -> SyncResult<()> {
        if self.schedule_path.as_os_str().is_empty() {
            return Err(SyncError::Config("schedule_path must not be empty".into()));
        }
        if self.license.account_id.trim().is_empty() {
            return Err(SyncError::Config("license.account_id must not be empty".into()));
        }
        if self.license.client_id.trim().is_empty() {
            return Err(SyncError::Config("license.client_id must not be empty".into()));
        }
        if self.license.licensed_type == self.license.basic_type {
            return Err(SyncError::Config(
                "license.licensed_type and license.basic_type must differ".into(),
            ));
        }
        if let Some(telegram) = &self.telegram {
            if telegram.chat_id.trim().is_empty() {
                return Err(SyncError::Config("telegram.chat_id must not be empty".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    const MINIMAL: &str = r#"{
        "schedule_path": "schedule.json",
        "exempt_users": ["dean@uni.edu", " dean@uni.edu ", ""],
        "license": { "account_id": "acc", "client_id": "cid" }
    }"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = SyncConfig::from_json_str(MINIMAL).unwrap();
        assert_eq!(config.exempt_users.len(), 1);
        assert!(config.exempt_users.contains(&UserId::from("dean@uni.edu")));
        assert_eq!(config.license.licensed_type, 2);
        assert_eq!(config.license.basic_type, 1);
        assert_eq!(config.license.auth_url.as_str(), DEFAULT_AUTH_URL);
        assert!(config.telegram.is_none());
    }

    #[test]
    fn missing_exempt_users_is_rejected() {
        let raw = r#"{
            "schedule_path": "schedule.json",
            "license": { "account_id": "acc", "client_id": "cid" }
        }"#;
        let err = SyncConfig::from_json_str(raw).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert!(err.to_string().contains("exempt_users"));
    }

    #[test]
    fn explicit_empty_exempt_users_is_allowed() {
        let raw = r#"{
            "schedule_path": "schedule.json",
            "exempt_users": [],
            "license": { "account_id": "acc", "client_id": "cid" }
        }"#;
        let config = SyncConfig::from_json_str(raw).unwrap();
        assert!(config.exempt_users.is_empty());
    }

    #[test]
    fn invalid_url_is_rejected() {
        let raw = r#"{
            "schedule_path": "schedule.json",
            "exempt_users": [],
            "license": { "account_id": "acc", "client_id": "cid", "api_base_url": "not a url" }
        }"#;
        assert!(SyncConfig::from_json_str(raw).is_err());
    }

    #[test]
    fn blank_chat_id_is_rejected() {
        let raw = r#"{
            "schedule_path": "schedule.json",
            "exempt_users": [],
            "license": { "account_id": "acc", "client_id": "cid" },
            "telegram": { "chat_id": " " }
        }"#;
        assert!(SyncConfig::from_json_str(raw).is_err());
    }

    #[test]
    fn load_resolves_schedule_relative_to_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seatsync.json");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = SyncConfig::load(&path).unwrap();
        assert_eq!(config.schedule_path, dir.path().join("schedule.json"));
    }
}
