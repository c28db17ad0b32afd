// ── Log stream session ──
//
// Owns the pub/sub transport, the device directory, and the stop signal.
// `log` drives one subscription to completion: it resolves the channel,
// subscribes, and then waits on stop / message / error until one of them
// ends the stream. Stopping flushes payloads that were already delivered.
// Once subscribed, the transport is aborted on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::Error;
use crate::logs::backend::{CredentialSource, DeviceDirectory, PubSubTransport, Subscription};
use crate::logs::channel::resolve_channel;
use crate::logs::envelope::decode_payload;
use crate::logs::sink::LogSink;
use crate::models::PubSubKeys;
use crate::pubnub::PubNubTransport;

// ── StreamState ──────────────────────────────────────────────────

/// Lifecycle of the session's stream, observable via [`Session::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Subscribing,
    Streaming,
    Closed,
}

// ── StopHandle ───────────────────────────────────────────────────

/// Cloneable handle that stops a session's stream from another task.
///
/// Stopping is idempotent and never blocks, whether or not a stream is
/// running.
#[derive(Debug, Clone)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

// ── Session ──────────────────────────────────────────────────────

/// Streams live logs for devices over a pub/sub transport.
///
/// One session serves any number of devices, one stream at a time. The stop
/// signal is single-shot: once [`close`](Self::close) has been called every
/// later [`log`](Self::log) returns `Ok(())` straight away without
/// subscribing.
pub struct Session<D, T> {
    directory: D,
    transport: T,
    stop: CancellationToken,
    state: watch::Sender<StreamState>,
    streaming: AtomicBool,
}

impl<D> Session<D, PubNubTransport>
where
    D: DeviceDirectory + CredentialSource,
{
    /// Open a session that streams over PubNub.
    pub async fn connect(directory: D, config: &ClientConfig) -> Result<Self, Error> {
        let origin = config.pubnub_origin.clone();
        let transport = config.transport.clone();
        Self::new(directory, move |keys| {
            PubNubTransport::new(&keys, origin, &transport)
        })
        .await
    }
}

impl<D, T> Session<D, T>
where
    D: DeviceDirectory + CredentialSource,
    T: PubSubTransport,
{
    /// Fetch pub/sub credentials and build the transport from them.
    ///
    /// Fails with [`Error::NoPubSubCredentials`] when the key material is
    /// empty; `make_transport` is not called in that case.
    pub async fn new<F>(directory: D, make_transport: F) -> Result<Self, Error>
    where
        F: FnOnce(PubSubKeys) -> Result<T, Error>,
    {
        let keys = directory.pubsub_keys().await?;
        if keys.is_empty() {
            return Err(Error::NoPubSubCredentials);
        }
        let transport = make_transport(keys)?;
        Ok(Self::from_parts(directory, transport))
    }
}

impl<D, T> Session<D, T>
where
    D: DeviceDirectory,
    T: PubSubTransport,
{
    /// Assemble a session from an already-built transport.
    pub fn from_parts(directory: D, transport: T) -> Self {
        let (state, _) = watch::channel(StreamState::Idle);
        Self {
            directory,
            transport,
            stop: CancellationToken::new(),
            state,
            streaming: AtomicBool::new(false),
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Subscribe to stream state changes.
    pub fn state(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            token: self.stop.clone(),
        }
    }

    /// Request termination of the running stream. Safe to call at any time
    /// and any number of times.
    pub fn close(&self) {
        self.stop.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Resolve the logs channel for `uuid` without subscribing.
    pub async fn channel(&self, uuid: &str) -> Result<String, Error> {
        resolve_channel(&self.directory, uuid).await
    }

    /// Resolve the channel for `uuid` and open a subscription on it.
    pub async fn subscribe(&self, uuid: &str) -> Result<Subscription, Error> {
        self.state.send_replace(StreamState::Subscribing);

        match self.open(uuid).await {
            Ok(subscription) => {
                self.state.send_replace(StreamState::Streaming);
                Ok(subscription)
            }
            Err(e) => {
                self.state.send_replace(StreamState::Closed);
                Err(e)
            }
        }
    }

    async fn open(&self, uuid: &str) -> Result<Subscription, Error> {
        let channel = self.channel(uuid).await?;
        let subscription = self.transport.subscribe(&channel)?;
        info!(uuid, %channel, "streaming device logs");
        Ok(subscription)
    }

    /// Stream logs for `uuid` into `sink` until stopped or the transport fails.
    ///
    /// Blocks the calling task. Returns `Ok(())` after [`close`](Self::close)
    /// and the transport's error otherwise. Payloads that fail to decode and
    /// lines the sink refuses are logged and skipped. A second concurrent
    /// call fails with [`Error::StreamActive`].
    pub async fn log<S: LogSink>(&self, uuid: &str, sink: &mut S) -> Result<(), Error> {
        let _guard = StreamGuard::acquire(&self.streaming)?;

        if self.stop.is_cancelled() {
            debug!(uuid, "session already closed, not subscribing");
            self.state.send_replace(StreamState::Closed);
            return Ok(());
        }

        let Subscription {
            mut messages,
            mut errors,
        } = self.subscribe(uuid).await?;

        let result = self.consume(&mut messages, &mut errors, sink).await;

        self.transport.abort();
        self.state.send_replace(StreamState::Closed);
        result
    }

    async fn consume<S: LogSink>(
        &self,
        messages: &mut mpsc::UnboundedReceiver<Bytes>,
        errors: &mut mpsc::UnboundedReceiver<Bytes>,
        sink: &mut S,
    ) -> Result<(), Error> {
        loop {
            tokio::select! {
                biased;
                () = self.stop.cancelled() => {
                    // Payloads already handed over still reach the sink.
                    while let Ok(payload) = messages.try_recv() {
                        deliver(&payload, sink).await;
                    }
                    info!("stopping device log stream");
                    return Ok(());
                }
                message = messages.recv() => match message {
                    Some(payload) => deliver(&payload, sink).await,
                    // The transport hung up. Surface its last word if it left one.
                    None => {
                        return Err(errors
                            .try_recv()
                            .map_or(Error::SubscriptionClosed, |raw| transport_error(&raw)));
                    }
                },
                Some(raw) = errors.recv() => return Err(transport_error(&raw)),
            }
        }
    }
}

/// Marks a session as streaming until dropped.
struct StreamGuard<'a>(&'a AtomicBool);

impl<'a> StreamGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, Error> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::StreamActive)?;
        Ok(Self(flag))
    }
}

impl Drop for StreamGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn deliver<S: LogSink>(payload: &[u8], sink: &mut S) {
    let lines = match decode_payload(payload) {
        Ok(lines) => lines,
        Err(e) => {
            warn!(error = %e, bytes = payload.len(), "dropping undecodable log payload");
            return;
        }
    };

    for line in &lines {
        if let Err(e) = sink.write_line(line).await {
            warn!(error = %e, "log sink rejected line");
        }
    }
}

fn transport_error(raw: &[u8]) -> Error {
    Error::PubSub {
        message: String::from_utf8_lossy(raw).into_owned(),
    }
}
