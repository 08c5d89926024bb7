//! # Connectivity management
//!
//! A node only does useful work while it can reach its broker. This module
//! owns the two layers that make that possible and keeps them in order:
//!
//! ```text
//!  Disconnected ──► NetworkConnecting ──► NetworkUp ──► BrokerConnecting ──► BrokerUp
//!                        ▲                                 │    ▲  (retry)      │
//!                        │                                 │    └──────┘        │
//!                        └───── network lost ──────────────┘                    │
//!                        └───── network lost / broker session dropped ──────────┘
//! ```
//!
//! The broker layer only progresses while the network layer is up. Both
//! reconnect loops block the caller: with no connection there is nothing else
//! for the node to do. Waiting goes through the injected [`Delay`], so the
//! loops run instantly under test.
//!
//! [`Delay`]: crate::time::Delay

#![deny(unsafe_code)]

mod manager;

pub use manager::{ConnectivityManager, RetryPolicy};

/// Connection state of the node.
///
/// Owned by [`ConnectivityManager`]; only the manager moves it.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConnectionState {
    /// Nothing attempted yet.
    Disconnected,
    /// Joining the network.
    NetworkConnecting,
    /// Network joined, no broker session.
    NetworkUp,
    /// Broker handshake in progress or being retried.
    BrokerConnecting,
    /// Broker session established; publishing is allowed.
    BrokerUp,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConnectionState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConnectionState::Disconnected => defmt::write!(f, "Disconnected"),
            ConnectionState::NetworkConnecting => defmt::write!(f, "NetworkConnecting"),
            ConnectionState::NetworkUp => defmt::write!(f, "NetworkUp"),
            ConnectionState::BrokerConnecting => defmt::write!(f, "BrokerConnecting"),
            ConnectionState::BrokerUp => defmt::write!(f, "BrokerUp"),
        }
    }
}

/// Errors returned by [`ConnectivityManager::publish`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// No broker session; nothing was sent.
    NotReady,
    /// The transport rejected the message.
    PublishFailed,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotReady => defmt::write!(f, "NotReady"),
            Error::PublishFailed => defmt::write!(f, "PublishFailed"),
        }
    }
}

/// A publish/subscribe session with a message broker.
///
/// Implemented by the transport. Credentials and the broker address are
/// given to the implementation when it is built; the manager only supplies
/// the client identifier.
///
/// [`MqttSession`](crate::network::mqtt::MqttSession) is the implementation
/// shipped with this crate.
pub trait BrokerSession {
    /// Associated error type
    type Error: core::fmt::Debug;

    /// Performs the session handshake, replacing any previous session.
    fn connect(&mut self, client_id: &str) -> Result<(), Self::Error>;

    /// Whether the session is currently established.
    ///
    /// Implementations report `false` once they consider the session broken,
    /// for example after a failed write or a missed keep-alive response.
    fn is_connected(&self) -> bool;

    /// Sends one message. Never retried by the caller within a tick.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;

    /// Runs keep-alive and acknowledgement bookkeeping. Called once per loop
    /// iteration with the current monotonic time.
    fn service(&mut self, now_ms: u64) -> Result<(), Self::Error>;

    /// Drops the session without waiting for the broker.
    fn disconnect(&mut self);
}
