//! Platform implementations of the node's capabilities.
//!
//! Microcontroller targets bring their own implementations of
//! [`Clock`](crate::time::Clock), [`Delay`](crate::time::Delay),
//! [`Interface`](crate::network::Interface),
//! [`Connect`](crate::network::Connect) and
//! [`AnalogInput`](crate::sensor::AnalogInput). Hosted targets can use the
//! ones in [`host`].

/// Implementations backed by the standard library
#[cfg(feature = "std")]
pub mod host;
