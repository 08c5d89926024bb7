//! # Telemetry
//!
//! The scheduling loop and the wire format of the reports it publishes.
//!
//! - [`publisher`]: turns a temperature into a topic and a JSON payload.
//! - [`scheduler`]: the single control loop of the node.
//!
//! # Example
//!
//! ```rust,no_run
//! # use thermonode::connectivity::{BrokerSession, ConnectivityManager};
//! # use thermonode::network::Interface;
//! # use thermonode::sensor::AnalogInput;
//! # use thermonode::time::{Clock, Delay};
//! use thermonode::config::NodeConfig;
//! use thermonode::sensor::Thermistor;
//! use thermonode::telemetry::Scheduler;
//!
//! # fn demo<A: AnalogInput, K: Clock, I: Interface, S: BrokerSession, D: Delay>(
//! #     adc: A, clock: K, interface: I, session: S, delay: D,
//! # ) {
//! let config = NodeConfig::from_build_env().unwrap();
//! let connectivity =
//!     ConnectivityManager::new(interface, session, delay, config.device, config.wifi).unwrap();
//!
//! let mut scheduler = Scheduler::new(
//!     config.device,
//!     Thermistor::new(config.thermistor),
//!     adc,
//!     clock,
//!     connectivity,
//! );
//! scheduler.run();
//! # }
//! ```

#![deny(unsafe_code)]

/// Error types for telemetry formatting
pub mod error;

/// Topic and payload formatting
pub mod publisher;

/// The control loop
pub mod scheduler;

pub use error::Error;
pub use publisher::{TelemetryMessage, format};
pub use scheduler::{ScheduleClock, Scheduler, Tick};
