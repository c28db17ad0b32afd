// resin API response types
//
// Only the resources the log streamer touches are modelled: devices (for
// logs-channel resolution) and the public remote configuration (for pub/sub
// keys). Unknown fields are kept in `extra` so nothing the API sends is
// silently dropped.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// OData collection wrapper: every collection endpoint answers `{ "d": [...] }`.
#[derive(Debug, Deserialize)]
pub struct ODataResponse<T> {
    pub d: Vec<T>,
}

/// A device registered with the resin API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub id: i64,
    pub name: String,
    pub uuid: String,
    pub device_type: String,
    pub is_online: bool,
    pub status: Option<String>,
    pub commit: Option<String>,
    pub ip_address: Option<String>,
    pub vpn_address: Option<String>,
    pub public_address: Option<String>,
    pub supervisor_version: Option<String>,
    pub os_version: Option<String>,
    pub note: Option<String>,
    pub location: Option<String>,

    /// Explicit logs channel identifier. When present, the device publishes
    /// its logs on `device-<logs_channel>-logs` instead of `device-<uuid>-logs`.
    pub logs_channel: Option<String>,

    /// All remaining fields the API sends.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Device {
    /// The logs-channel override, if one is set and non-empty.
    pub fn logs_channel(&self) -> Option<&str> {
        self.logs_channel.as_deref().filter(|channel| !channel.is_empty())
    }
}

/// Public remote configuration served at `GET /config`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteConfig {
    pub pubnub: Option<PubNubConfig>,
    pub debug_enabled: bool,
    pub device_urls_base: Option<String>,
    pub git_server_url: Option<String>,
    pub admin_url: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Raw pubnub section of [`RemoteConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PubNubConfig {
    pub publish_key: String,
    pub subscribe_key: String,
}

/// Pub/sub key material used to open log subscriptions.
#[derive(Debug, Clone)]
pub struct PubSubKeys {
    pub publish_key: SecretString,
    pub subscribe_key: String,
}

impl PubSubKeys {
    pub fn new(publish_key: impl Into<String>, subscribe_key: impl Into<String>) -> Self {
        Self {
            publish_key: SecretString::from(publish_key.into()),
            subscribe_key: subscribe_key.into(),
        }
    }

    /// Both keys are required; either one missing means no usable credentials.
    pub fn is_empty(&self) -> bool {
        self.publish_key.expose_secret().is_empty() || self.subscribe_key.is_empty()
    }
}

impl From<PubNubConfig> for PubSubKeys {
    fn from(config: PubNubConfig) -> Self {
        Self::new(config.publish_key, config.subscribe_key)
    }
}
