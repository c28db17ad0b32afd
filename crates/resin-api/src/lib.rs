// resin-api: Async Rust client for the resin.io device API and live device logs

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod logs;
pub mod models;
pub mod odata;
pub mod pubnub;
pub mod transport;

pub use auth::TokenClaims;
pub use client::ResinClient;
pub use config::{ApiVersion, ClientConfig};
pub use error::Error;
pub use models::{Device, PubSubKeys, RemoteConfig};
pub use pubnub::PubNubTransport;
pub use transport::{TlsMode, TransportConfig};
