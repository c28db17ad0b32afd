//! CLI error types with miette diagnostics.
//!
//! Maps `resin_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use resin_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {url}")]
    #[diagnostic(
        code(resin::connection_failed),
        help("Check your network connection and the configured api_url.")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS error: {message}")]
    #[diagnostic(
        code(resin::tls_error),
        help("Use --insecure (-k) to accept the certificate, or configure ca_cert in your profile.")
    )]
    TlsError { message: String },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(resin::timeout),
        help("Increase the timeout with --timeout or check API responsiveness.")
    )]
    Timeout { url: String },

    #[error("Log stream ended: {message}")]
    #[diagnostic(
        code(resin::stream_failed),
        help("The PubNub subscription failed. Re-run the command to reconnect.")
    )]
    StreamFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(resin::auth_failed),
        help(
            "Your session token was rejected or could not be decoded.\n\
             Copy a fresh token from the dashboard preferences and set RESIN_TOKEN."
        )
    )]
    AuthFailed { message: String },

    #[error("No session token configured for profile '{profile}'")]
    #[diagnostic(
        code(resin::no_credentials),
        help(
            "Pass --token, set RESIN_TOKEN, add `token_env` or `token` to the profile,\n\
             or write the token to {token_path}"
        )
    )]
    NoCredentials { profile: String, token_path: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Device '{uuid}' not found")]
    #[diagnostic(
        code(resin::device_not_found),
        help("Check the device UUID and that your account can see the device.")
    )]
    DeviceNotFound { uuid: String },

    #[error("The API does not advertise PubNub keys")]
    #[diagnostic(
        code(resin::no_pubnub_keys),
        help("Live logs are unavailable on this API. Check api_url points at a resin API.")
    )]
    NoPubSubCredentials,

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(resin::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected API response: {message}")]
    #[diagnostic(code(resin::unexpected_response))]
    UnexpectedResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(resin::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(resin::profile_not_found),
        help("Available profiles: {available}\nConfig file: {path}")
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error(transparent)]
    #[diagnostic(code(resin::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    #[diagnostic(code(resin::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } | Self::StreamFailed { .. } => {
                exit_code::CONNECTION
            }
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── resin_api::Error → CliError ──────────────────────────────────────

impl From<resin_api::Error> for CliError {
    fn from(err: resin_api::Error) -> Self {
        use resin_api::Error;

        match err {
            Error::Authentication { message } => Self::AuthFailed { message },
            Error::BadToken => Self::AuthFailed {
                message: "session token could not be decoded".into(),
            },

            Error::Transport(e) => {
                let url = e.url().map(ToString::to_string).unwrap_or_default();
                if e.is_timeout() {
                    Self::Timeout { url }
                } else {
                    Self::ConnectionFailed {
                        url,
                        source: Box::new(e),
                    }
                }
            }
            Error::InvalidUrl(e) => Self::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },
            Error::Tls(message) => Self::TlsError { message },

            Error::Api { status, message } => Self::ApiError { status, message },
            Error::DeviceNotFound { uuid } => Self::DeviceNotFound { uuid },
            Error::NoPubSubCredentials => Self::NoPubSubCredentials,

            err @ (Error::Subscribe(_)
            | Error::PubSub { .. }
            | Error::SubscriptionClosed
            | Error::StreamActive) => {
                Self::StreamFailed {
                    message: err.to_string(),
                }
            }

            Error::Deserialization { message, .. } => Self::UnexpectedResponse { message },
        }
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials {
                profile,
                token_path: resin_config::data_dir().join("token").display().to_string(),
            },
            ConfigError::Serialization(e) => Self::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}
