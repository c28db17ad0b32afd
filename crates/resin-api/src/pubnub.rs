//! PubNub subscribe transport.
//!
//! Follows a channel with PubNub's HTTP long-poll subscribe API:
//!
//! ```text
//! GET {origin}/subscribe/{subscribe_key}/{channel}/0/{timetoken}?uuid={client}
//! -> [ [<message>, ...], "<next timetoken>" ]
//! ```
//!
//! Each subscription runs a poller on its own Tokio task. Responses that
//! carry messages are forwarded untouched on the subscription's message
//! source; decoding is the consumer's business. Any HTTP or protocol failure
//! is forwarded on the error source and ends the poller. There is no retry:
//! a failed subscription stays failed.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;
use uuid::Uuid;

use crate::error::Error;
use crate::logs::backend::{PubSubTransport, Subscription};
use crate::models::PubSubKeys;
use crate::transport::TransportConfig;

/// PubNub holds a subscribe request open for up to ~280s before answering
/// with an empty batch; the HTTP timeout has to outlast that.
const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(310);

/// Timetoken that asks PubNub for the current position without messages.
const INITIAL_TIMETOKEN: &str = "0";

// ── PubNubTransport ──────────────────────────────────────────────────

/// [`PubSubTransport`] backed by PubNub's HTTP subscribe API.
pub struct PubNubTransport {
    http: reqwest::Client,
    origin: Url,
    subscribe_key: String,
    client_id: String,
    active: Mutex<Vec<CancellationToken>>,
}

impl PubNubTransport {
    /// Build a transport whose HTTP timeout covers a full long-poll cycle.
    pub fn new(keys: &PubSubKeys, origin: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport
            .with_min_timeout(LONG_POLL_TIMEOUT)
            .build_client()?;
        Ok(Self::with_client(http, keys, origin))
    }

    /// Build a transport around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, keys: &PubSubKeys, origin: Url) -> Self {
        Self {
            http,
            origin,
            subscribe_key: keys.subscribe_key.clone(),
            client_id: Uuid::new_v4().to_string(),
            active: Mutex::new(Vec::new()),
        }
    }

    /// Number of pollers that are still running.
    pub fn active_subscriptions(&self) -> usize {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.retain(|token| !token.is_cancelled());
        active.len()
    }

    /// `{origin}/subscribe/{subscribe_key}/{channel}/0`; the poller appends the timetoken.
    fn subscribe_url(&self, channel: &str) -> Result<Url, Error> {
        let mut url = self.origin.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Subscribe(format!("unusable PubNub origin: {}", self.origin)))?
            .pop_if_empty()
            .extend(["subscribe", self.subscribe_key.as_str(), channel, "0"]);
        Ok(url)
    }
}

impl PubSubTransport for PubNubTransport {
    fn subscribe(&self, channel: &str) -> Result<Subscription, Error> {
        let base = self.subscribe_url(channel)?;
        let (message_tx, messages) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            active.retain(|token| !token.is_cancelled());
            active.push(cancel.clone());
        }

        let poller = Poller {
            http: self.http.clone(),
            base,
            client_id: self.client_id.clone(),
            cancel,
            messages: message_tx,
            errors: error_tx,
        };
        tokio::spawn(poller.run());

        debug!(channel, "PubNub subscription started");
        Ok(Subscription { messages, errors })
    }

    fn abort(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        for token in active.drain(..) {
            token.cancel();
        }
    }
}

// ── Poller ───────────────────────────────────────────────────────────

struct Poller {
    http: reqwest::Client,
    base: Url,
    client_id: String,
    cancel: CancellationToken,
    messages: mpsc::UnboundedSender<Bytes>,
    errors: mpsc::UnboundedSender<Bytes>,
}

impl Poller {
    /// Poll until cancelled, the subscriber goes away, or a request fails.
    async fn run(self) {
        let mut timetoken = INITIAL_TIMETOKEN.to_string();

        loop {
            let polled = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                polled = self.poll(&timetoken) => polled,
            };

            match polled {
                Ok((body, cursor)) => {
                    if cursor.has_messages && self.messages.send(body).is_err() {
                        debug!("subscriber dropped, stopping poller");
                        break;
                    }
                    timetoken = cursor.timetoken;
                }
                Err(message) => {
                    warn!(url = %self.base, error = %message, "PubNub subscribe failed");
                    let _ = self.errors.send(Bytes::from(message));
                    break;
                }
            }
        }

        // Marks this poller as finished for the transport's registry.
        self.cancel.cancel();
        debug!(url = %self.base, "PubNub poller exiting");
    }

    async fn poll(&self, timetoken: &str) -> Result<(Bytes, Cursor), String> {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(timetoken);
        }
        trace!(%url, "PubNub subscribe");

        let resp = self
            .http
            .get(url)
            .query(&[("uuid", self.client_id.as_str())])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!(
                "HTTP {}: {}",
                status.as_u16(),
                String::from_utf8_lossy(&body)
            ));
        }

        let cursor = Cursor::parse(&body)?;
        Ok((body, cursor))
    }
}

// ── Response cursor ──────────────────────────────────────────────────

/// What the poller needs from a subscribe response to carry on.
#[derive(Debug, PartialEq, Eq)]
struct Cursor {
    has_messages: bool,
    timetoken: String,
}

impl Cursor {
    fn parse(body: &[u8]) -> Result<Self, String> {
        let envelope: Vec<Value> = serde_json::from_slice(body)
            .map_err(|e| format!("malformed subscribe response: {e}"))?;

        let has_messages = match envelope.first() {
            Some(Value::Array(messages)) => !messages.is_empty(),
            _ => return Err("subscribe response has no message array".into()),
        };
        let timetoken = envelope
            .get(1)
            .and_then(Value::as_str)
            .ok_or("subscribe response has no timetoken")?
            .to_owned();

        Ok(Self {
            has_messages,
            timetoken,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn transport(origin: &str) -> PubNubTransport {
        PubNubTransport::with_client(
            reqwest::Client::new(),
            &PubSubKeys::new("pub-c-1", "sub-c-1"),
            Url::parse(origin).unwrap(),
        )
    }

    #[test]
    fn subscribe_url_layout() {
        let url = transport("https://ps.pndsn.com")
            .subscribe_url("device-abc-logs")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://ps.pndsn.com/subscribe/sub-c-1/device-abc-logs/0"
        );
    }

    #[test]
    fn channel_names_are_escaped() {
        let url = transport("http://localhost:8080/")
            .subscribe_url("device-a/b-logs")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/subscribe/sub-c-1/device-a%2Fb-logs/0"
        );
    }

    #[test]
    fn cursor_from_empty_handshake() {
        let cursor = Cursor::parse(br#"[[],"15000000000000000"]"#).unwrap();
        assert_eq!(
            cursor,
            Cursor {
                has_messages: false,
                timetoken: "15000000000000000".into()
            }
        );
    }

    #[test]
    fn cursor_with_messages_and_channel_list() {
        let cursor =
            Cursor::parse(br#"[[[{"m":"hi"}]],"15000000000000001","device-abc-logs"]"#).unwrap();
        assert!(cursor.has_messages);
        assert_eq!(cursor.timetoken, "15000000000000001");
    }

    #[test]
    fn cursor_rejects_unexpected_shapes() {
        assert!(Cursor::parse(br#"{"status":403}"#).is_err());
        assert!(Cursor::parse(br#"[[]]"#).is_err());
        assert!(Cursor::parse(br#"["x","1"]"#).is_err());
    }

    #[test]
    fn abort_without_subscriptions_is_noop() {
        let transport = transport("https://ps.pndsn.com");
        transport.abort();
        transport.abort();
        assert_eq!(transport.active_subscriptions(), 0);
    }
}
