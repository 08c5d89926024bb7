//! MQTT 3.1.1 transport for the node.
//!
//! Two layers:
//!
//! - [`client::Client`] speaks the protocol over any [`Connection`]: CONNECT
//!   with optional credentials, QoS 0 PUBLISH, PINGREQ and DISCONNECT. It
//!   keeps no timers of its own.
//! - [`session::MqttSession`] implements
//!   [`BrokerSession`](crate::connectivity::BrokerSession) on top of it:
//!   it opens the TCP connection, runs the keep-alive from the control loop's
//!   clock and reports a session as disconnected once a write fails or a
//!   PINGRESP goes missing.
//!
//! Subscriptions and QoS 1/2 are not implemented; a publishing node does not
//! need them.
//!
//! # Wire layout of a PUBLISH
//!
//! ```text
//! 0x30 | remaining length | topic length (u16 BE) | topic | payload
//! ```
//!
//! [`Connection`]: crate::network::Connection

/// MQTT client implementation and supporting types.
pub mod client;

/// Broker session with keep-alive.
pub mod session;

pub use client::{Client, Incoming, Options};
pub use session::MqttSession;
