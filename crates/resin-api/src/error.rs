use thiserror::Error;

/// Top-level error type for the `resin-api` crate.
///
/// Covers the REST calls the log streamer depends on, the pub/sub transport,
/// and the log stream lifecycle. Per-payload decode failures are *not* part
/// of this enum: they never terminate a stream (see
/// [`DecodeError`](crate::logs::DecodeError)).
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The API rejected the session token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Session token could not be decoded.
    #[error("Bad session token")]
    BadToken,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success HTTP status from the resin API.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// No device matches the requested UUID.
    #[error("Device '{uuid}' not found")]
    DeviceNotFound { uuid: String },

    /// The remote configuration carries no pub/sub key material.
    #[error("No pubnub details found in remote configuration")]
    NoPubSubCredentials,

    // ── Pub/sub ─────────────────────────────────────────────────────
    /// The transport refused to open a subscription.
    #[error("Subscription failed: {0}")]
    Subscribe(String),

    /// Error delivered on a subscription's error source. Terminal for the stream.
    #[error("Pub/sub transport error: {message}")]
    PubSub { message: String },

    /// The transport dropped the message source without reporting an error.
    #[error("Subscription closed by transport")]
    SubscriptionClosed,

    /// `log` was called while another stream is running on the same session.
    #[error("A log stream is already running on this session")]
    StreamActive,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session token needs to be refreshed.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::BadToken)
    }

    /// Returns `true` if this is a transient error worth retrying at the
    /// caller's discretion. Nothing in this crate retries on its own.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::PubSub { .. } | Self::SubscriptionClosed => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::DeviceNotFound { .. } | Self::Api { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }
}
