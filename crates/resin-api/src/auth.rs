use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::Error;

/// Claims carried in a resin session token.
///
/// Session tokens are JWTs. The API does not expect clients to verify the
/// signature, so only the payload segment is decoded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenClaims {
    pub username: Option<String>,
    #[serde(rename = "id")]
    pub user_id: Option<i64>,
    pub email: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decode the claims of `token` without verifying its signature.
    pub fn parse(token: &str) -> Result<Self, Error> {
        let payload = token.split('.').nth(1).ok_or(Error::BadToken)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| Error::BadToken)?;
        serde_json::from_slice(&bytes).map_err(|_| Error::BadToken)
    }

    /// A token without an expiry claim counts as expired.
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.exp.is_none_or(|exp| exp <= now_secs)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}

/// Returns `true` if `token` decodes and has not expired.
pub fn is_valid_token(token: &str) -> bool {
    TokenClaims::parse(token).is_ok_and(|claims| !claims.is_expired())
}

/// Default headers carrying the bearer token.
pub(crate) fn bearer_headers(token: &SecretString) -> Result<HeaderMap, Error> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
        .map_err(|_| Error::BadToken)?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}
