// Connection settings shared by the REST client and the log streamer.

use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::transport::TransportConfig;

/// Public resin API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.resin.io";
/// PubNub origin used for log subscriptions.
pub const DEFAULT_PUBNUB_ORIGIN: &str = "https://ps.pndsn.com";

/// Version segment of resource URLs (`{api}/{version}/{resource}`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    #[default]
    V1,
    V2,
    V3,
}

impl ApiVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            "v3" => Ok(Self::V3),
            other => Err(format!("expected 'v1', 'v2', or 'v3', got '{other}'")),
        }
    }
}

/// Everything needed to talk to the API and open log streams.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub api_version: ApiVersion,
    pub token: SecretString,
    pub pubnub_origin: Url,
    pub transport: TransportConfig,
}
