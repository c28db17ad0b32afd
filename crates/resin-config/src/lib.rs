//! Configuration for the resin CLI.
//!
//! TOML profiles, an environment overlay, session token resolution
//! (env + plaintext + token file), and translation to
//! `resin_api::ClientConfig`. The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use resin_api::config::{DEFAULT_API_URL, DEFAULT_PUBNUB_ORIGIN};
use resin_api::{ApiVersion, ClientConfig, TlsMode, TransportConfig};

/// Prefix of environment variables overlaid onto the config file.
pub const ENV_PREFIX: &str = "RESIN_";
/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "RESIN_CONFIG";
/// Overrides the data directory holding the session token file.
pub const DATA_DIR_ENV: &str = "RESIN_DATA_DIRECTORY";
/// Session token fallback consulted after a profile's `token_env`.
pub const TOKEN_ENV: &str = "RESIN_TOKEN";

const TOKEN_FILE_NAME: &str = "token";
const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no session token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named API profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Copy with every plaintext token masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for profile in config.profiles.values_mut() {
            if profile.token.is_some() {
                profile.token = Some(REDACTED.into());
            }
        }
        config
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub api_version: ApiVersion,

    #[serde(default = "default_pubnub_origin")]
    pub pubnub_origin: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_version: ApiVersion::default(),
            pubnub_origin: default_pubnub_origin(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_pubnub_origin() -> String {
    DEFAULT_PUBNUB_ORIGIN.into()
}
fn default_timeout() -> u64 {
    30
}

/// A named API profile. Unset fields fall back to [`Defaults`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Profile {
    /// API base URL (e.g., "https://api.resin.io").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Resource URL version: "v1", "v2", or "v3".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<ApiVersion>,

    /// PubNub origin for log subscriptions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubnub_origin: Option<String>,

    /// Session token (plaintext, prefer `token_env` or the token file).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable name containing the session token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Token file location. Defaults to `<data dir>/token`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,

    /// Path to custom CA certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "resin", "resin")
}

fn home_fallback(dir: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(dir);
    p
}

/// Resolve the config file path: `RESIN_CONFIG`, else the platform config dir.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    project_dirs().map_or_else(
        || home_fallback(".resin").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding the session token file: `RESIN_DATA_DIRECTORY`, else
/// the platform data dir, else `~/.resin`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    project_dirs().map_or_else(
        || home_fallback(".resin"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

/// Token file for `profile`.
pub fn token_path(profile: &Profile) -> PathBuf {
    profile
        .token_file
        .clone()
        .unwrap_or_else(|| data_dir().join(TOKEN_FILE_NAME))
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// A missing file is not an error; defaults and `RESIN_*` variables still
/// apply. Nested keys use a double underscore:
/// `RESIN_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config");
        Config::default()
    })
}

/// Resolve the active profile name: explicit choice, then `default_profile`.
pub fn active_profile_name(explicit: Option<&str>, config: &Config) -> String {
    explicit
        .map(str::to_owned)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the session token from the credential chain.
///
/// 1. the variable named by the profile's `token_env`
/// 2. `RESIN_TOKEN`
/// 3. plaintext `token` in the profile
/// 4. the token file
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.token_env {
        if let Some(token) = non_empty_env(env_name) {
            return Ok(SecretString::from(token));
        }
    }

    if let Some(token) = non_empty_env(TOKEN_ENV) {
        return Ok(SecretString::from(token));
    }

    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    if let Some(token) = read_token_file(&token_path(profile))? {
        return Ok(token);
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read a token file. A missing or blank file yields `None`.
pub fn read_token_file(path: &Path) -> Result<Option<SecretString>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let token = contents.trim();
            Ok((!token.is_empty()).then(|| SecretString::from(token.to_owned())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── ClientConfig translation ────────────────────────────────────────

/// Build a `ClientConfig` from a profile and an already-resolved token.
pub fn build_client_config(
    profile: &Profile,
    defaults: &Defaults,
    token: SecretString,
) -> Result<ClientConfig, ConfigError> {
    let api_url = parse_url("api_url", profile.api_url.as_deref().unwrap_or(&defaults.api_url))?;
    let pubnub_origin = parse_url(
        "pubnub_origin",
        profile
            .pubnub_origin
            .as_deref()
            .unwrap_or(&defaults.pubnub_origin),
    )?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(ClientConfig {
        api_url,
        api_version: profile.api_version.unwrap_or(defaults.api_version),
        token,
        pubnub_origin,
        transport: TransportConfig { tls, timeout },
    })
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{value}': {e}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("'{value}' cannot be used as a base URL"),
        });
    }
    Ok(url)
}
