//! Collaborator seams for the log streamer.
//!
//! The session never talks HTTP or PubNub directly. It consumes three narrow
//! interfaces, which keeps it testable with scripted fakes and lets callers
//! swap the pub/sub transport.

use std::future::Future;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::client::ResinClient;
use crate::error::Error;
use crate::models::{Device, PubSubKeys};

/// Device metadata lookup.
pub trait DeviceDirectory: Send + Sync {
    /// Fetch a device by UUID, failing with [`Error::DeviceNotFound`] when
    /// nothing matches.
    fn device_by_uuid(&self, uuid: &str) -> impl Future<Output = Result<Device, Error>> + Send;
}

/// Source of pub/sub key material.
pub trait CredentialSource: Send + Sync {
    fn pubsub_keys(&self) -> impl Future<Output = Result<PubSubKeys, Error>> + Send;
}

/// A publish/subscribe transport that can follow one channel at a time per
/// subscription.
pub trait PubSubTransport: Send + Sync {
    /// Start following `channel`. Must not block: delivery happens on the
    /// returned receivers from the transport's own task.
    fn subscribe(&self, channel: &str) -> Result<Subscription, Error>;

    /// Cancel every active subscription. Idempotent.
    fn abort(&self);
}

/// The two event sources of an open subscription.
///
/// `messages` carries raw payloads exactly as the transport received them;
/// `errors` carries raw error descriptions. A transport ends a subscription
/// by dropping its senders.
#[derive(Debug)]
pub struct Subscription {
    pub messages: mpsc::UnboundedReceiver<Bytes>,
    pub errors: mpsc::UnboundedReceiver<Bytes>,
}

impl DeviceDirectory for ResinClient {
    fn device_by_uuid(&self, uuid: &str) -> impl Future<Output = Result<Device, Error>> + Send {
        ResinClient::device_by_uuid(self, uuid)
    }
}

impl CredentialSource for ResinClient {
    fn pubsub_keys(&self) -> impl Future<Output = Result<PubSubKeys, Error>> + Send {
        ResinClient::pubsub_keys(self)
    }
}
