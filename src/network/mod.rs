//! Network capabilities and transport.
//!
//! The node does not implement a network stack. It relies on the platform for
//! two things, both expressed as traits here:
//!
//! - link attachment ([`Interface`]): joining the wireless network and
//!   acquiring an address,
//! - byte streams ([`Connect`] / [`Connection`]): opening a TCP connection to
//!   the broker and reading and writing on it.
//!
//! On top of the byte stream the [`mqtt`] module provides the MQTT 3.1.1
//! client the node publishes with.
//!
//! # Read semantics
//!
//! [`Read::read`] must not block indefinitely. `Ok(0)` means "nothing
//! available right now"; a peer that closed the stream is reported as an
//! error. The MQTT keep-alive relies on this to poll for responses from the
//! control loop.

#![allow(missing_docs)]
#![deny(unsafe_code)]

use core::net::Ipv4Addr;

use crate::config::WifiCredentials;

/// Common error types for network operations
pub mod error;

/// MQTT 3.1.1 client and broker session
pub mod mqtt;

// Core synchronous traits
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection; `Ok(0)` when nothing is pending
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {}

/// A synchronous connector (client)
pub trait Connect {
    /// Associated connection type
    type Connection: Connection;
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Open a connection to `remote`, given as `host:port`
    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error>;
}

/// Link-layer attachment of the node.
///
/// Wraps the platform's wireless station: association with an access point
/// and address acquisition. [`Interface::begin`] starts the process and
/// returns without waiting for it to finish; the caller polls
/// [`Interface::is_up`].
pub trait Interface {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Start joining the network described by `credentials`
    fn begin(&mut self, credentials: &WifiCredentials<'_>) -> Result<(), Self::Error>;
    /// Whether the node is associated and has an address
    fn is_up(&mut self) -> bool;
    /// Address acquired by the node, if any
    fn local_address(&self) -> Option<Ipv4Addr>;
}
