//! Live device log streaming.
//!
//! Devices publish their logs on a per-device PubNub channel. A [`Session`]
//! resolves that channel through the device directory, subscribes, decodes
//! each payload into lines, and writes them to a [`LogSink`] until the
//! caller stops it or the transport fails.
//!
//! # Example
//!
//! ```rust,ignore
//! use resin_api::logs::{Session, WriterSink};
//! use resin_api::ResinClient;
//!
//! let client = ResinClient::new(&config)?;
//! let session = Session::connect(client, &config).await?;
//! let stop = session.stop_handle();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     stop.stop();
//! });
//!
//! let mut sink = WriterSink::new(tokio::io::stdout());
//! session.log("49b2a76b7f188c1d6f781e67c8f34adb", &mut sink).await?;
//! ```

pub mod backend;
pub mod channel;
pub mod envelope;
pub mod session;
pub mod sink;

pub use backend::{CredentialSource, DeviceDirectory, PubSubTransport, Subscription};
pub use channel::{channel_name, resolve_channel};
pub use envelope::{DecodeError, EntryError, decode_batch, decode_payload};
pub use session::{Session, StopHandle, StreamState};
pub use sink::{LogSink, WriterSink};
