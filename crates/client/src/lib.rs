//! Client engine for OPC UA over TCP.
//!
//! A [`Client`] owns one connection. Construction performs the hello /
//! acknowledge handshake and starts two pieces of background work:
//!
//! - a receive task, the only reader of the transport, which matches each
//!   response to its caller by request handle;
//! - a notification worker thread (`ua-notify`) that runs subscription
//!   callbacks, so user code never runs on the receive task.
//!
//! Requests may be sent from any number of tasks at once. Frames are
//! written one at a time; responses may arrive in any order.
//!
//! # Example
//!
//! ```no_run
//! use ua_client::ua_types::NodeId;
//! use ua_client::{Client, ClientConfig};
//!
//! # async fn example() -> ua_client::Result<()> {
//! let client = Client::connect(ClientConfig::new("opc.tcp://localhost:4840")).await?;
//! client.open_secure_channel().await?;
//! client.create_session().await?;
//! client.activate_session_anonymous("anonymous").await?;
//!
//! let values = client.read_values([NodeId::numeric(0, 2258)]).await?;
//! println!("server time: {:?}", values[0].value);
//!
//! client.close_session().await?;
//! client.close_secure_channel().await;
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod browse;
mod channel;
mod client;
pub mod config;
mod correlator;
pub mod dispatcher;
pub mod error;
pub mod framing;
mod handshake;
pub mod logging;
mod message;
mod receive;
mod services;
pub mod subscription;

pub use client::{Client, WeakClient};
pub use config::{ClientBuilder, ClientConfig, SecureConnectionParams};
pub use error::{Error, Result};
pub use subscription::NotificationCallback;

// Re-export dependencies that are part of our public API
pub use ua_transport::{Transport, TransportError};
pub use ua_types;
