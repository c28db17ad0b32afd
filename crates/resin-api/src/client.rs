// resin REST client
//
// Wraps `reqwest::Client` with bearer-token auth, versioned resource URLs,
// OData filtering and `{ "d": [...] }` unwrapping. Only the two read calls
// the log streamer depends on live here: device lookup by UUID and the
// public remote configuration.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::bearer_headers;
use crate::config::{ApiVersion, ClientConfig};
use crate::error::Error;
use crate::models::{Device, ODataResponse, PubSubKeys, RemoteConfig};
use crate::odata;

/// Authenticated HTTP client for the resin API.
///
/// Cheap to share by reference across tasks: every method takes `&self` and
/// holds no per-call state, so concurrent lookups for different devices are
/// safe.
#[derive(Debug, Clone)]
pub struct ResinClient {
    http: reqwest::Client,
    api_url: Url,
    api_version: ApiVersion,
}

impl ResinClient {
    /// Create a client that sends `config.token` as a bearer token.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let headers = bearer_headers(&config.token)?;
        let http = config.transport.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_version: config.api_version,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for any auth headers.
    pub fn with_client(http: reqwest::Client, api_url: Url, api_version: ApiVersion) -> Self {
        Self {
            http,
            api_url,
            api_version,
        }
    }

    /// The API base URL.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/{version}/{resource}`
    pub(crate) fn resource_url(&self, resource: &str) -> Result<Url, Error> {
        self.root_url(&format!("{}/{resource}", self.api_version))
    }

    /// `{base}/{path}` for unversioned endpoints such as `/config`.
    pub(crate) fn root_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.api_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Look up a single device by UUID.
    ///
    /// `GET /{version}/device?$filter=uuid eq '<uuid>'`
    pub async fn device_by_uuid(&self, uuid: &str) -> Result<Device, Error> {
        let url = self.resource_url("device")?;
        let filter = odata::filter_eq_str("uuid", uuid);
        debug!(uuid, "looking up device");

        let response: ODataResponse<Device> =
            self.get_json(url, &[("$filter", filter.as_str())]).await?;
        response
            .d
            .into_iter()
            .next()
            .ok_or_else(|| Error::DeviceNotFound { uuid: uuid.into() })
    }

    /// Fetch the public remote configuration.
    ///
    /// `GET /config`
    pub async fn remote_config(&self) -> Result<RemoteConfig, Error> {
        let url = self.root_url("config")?;
        self.get_json(url, &[]).await
    }

    /// Pub/sub keys from the remote configuration.
    ///
    /// Fails with [`Error::NoPubSubCredentials`] when either key is missing.
    pub async fn pubsub_keys(&self) -> Result<PubSubKeys, Error> {
        let keys = self
            .remote_config()
            .await?
            .pubnub
            .map(PubSubKeys::from)
            .ok_or(Error::NoPubSubCredentials)?;
        if keys.is_empty() {
            return Err(Error::NoPubSubCredentials);
        }
        Ok(keys)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "session token rejected".into(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
