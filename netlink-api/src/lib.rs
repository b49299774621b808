//! Abstract client contract for NetOS Netlink desk controllers
//!
//! This crate defines the seam between the Netlink state-sync layer and the
//! wire protocol: an async [`NetlinkClient`] trait covering the REST-style
//! request methods and command setters, a typed [`ClientEvent`] envelope for
//! push events, and the [`ClientError`] taxonomy shared by every
//! implementation.
//!
//! Transport concerns (framing, reconnect backoff, request timeouts) belong
//! to the implementation behind the trait, never to consumers of it.
//!
//! # Event delivery
//!
//! Push events are delivered over a broadcast channel obtained from
//! [`NetlinkClient::subscribe`]. Subscribe *before* calling
//! [`NetlinkClient::connect`] so events raised during the handshake are
//! buffered rather than lost:
//!
//! ```rust,ignore
//! let events = client.subscribe();
//! client.connect().await?;
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}: {}", event.kind, event.payload);
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod event;

#[cfg(feature = "test-support")]
pub mod mock;

pub use client::NetlinkClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use event::{ClientEvent, EventKind};

#[cfg(feature = "test-support")]
pub use mock::MockNetlinkClient;
