//! # thermonode - NTC telemetry agent
//!
//! Firmware core for a network-attached temperature sensor node. The node
//! samples an NTC thermistor through an ADC, converts the reading to degrees
//! Celsius and publishes it to an MQTT broker every ten seconds, reconnecting
//! on its own whenever the network or the broker goes away.
//!
//! ## Components
//!
//! - [`sensor`]: raw ADC code → temperature (β thermistor model)
//! - [`connectivity`]: network attachment and broker session state machine
//! - [`telemetry`]: the control loop and the wire format of reports
//! - [`network`]: capability traits for the link and byte streams, plus the
//!   MQTT 3.1.1 client the node publishes with
//! - [`config`]: identity, credentials and calibration fixed at build time
//! - [`time`]: clock and delay capabilities
//! - [`platform`]: capability implementations for hosted targets
//!
//! ## Wire contract
//!
//! | Item      | Value                                         |
//! |-----------|-----------------------------------------------|
//! | Topic     | `sensor/{device}/data`                        |
//! | Payload   | `{"metric":"temperature","value":23.45}`      |
//! | Client id | `sensor-client-{device}`                      |
//! | Cadence   | 10 s                                          |
//!
//! ## Execution model
//!
//! Everything runs on one thread from a single loop. The only places that
//! block are the reconnect loops, and they wait through the injected
//! [`time::Delay`]. No heap allocation: all buffers are `heapless`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use thermonode::config::{BrokerConfig, DeviceId, WifiCredentials};
//! use thermonode::connectivity::ConnectivityManager;
//! use thermonode::network::mqtt::MqttSession;
//! use thermonode::sensor::{AnalogInput, Thermistor};
//! use thermonode::telemetry::Scheduler;
//! # use thermonode::network::{Connect, Interface};
//! # use thermonode::time::{Clock, Delay};
//!
//! # fn demo<A: AnalogInput, K: Clock, I: Interface, N: Connect, D: Delay>(
//! #     adc: A, clock: K, interface: I, connector: N, delay: D,
//! # ) {
//! let device = DeviceId::new(42);
//! let wifi = WifiCredentials { ssid: "greenhouse", passphrase: "secret" };
//! let broker = BrokerConfig::new("192.168.1.104").with_credentials("admin", "admin1234");
//!
//! let session = MqttSession::new(connector, broker);
//! let connectivity = ConnectivityManager::new(interface, session, delay, device, wifi).unwrap();
//! let mut scheduler = Scheduler::new(device, Thermistor::default(), adc, clock, connectivity);
//!
//! scheduler.run();
//! # }
//! ```
//!
//! ## Optional Features
//!
//! - `std`: host implementations of the capabilities ([`platform::host`])
//! - `defmt`: log through `defmt` instead of the `log` facade

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Node identity, credentials and calibration.
pub mod config;

/// Network attachment and broker session management.
pub mod connectivity;

/// Network capability traits and the MQTT transport.
pub mod network;

/// Capability implementations for specific platforms.
pub mod platform;

/// Thermistor sampling and conversion.
pub mod sensor;

/// The control loop and report formatting.
pub mod telemetry;

/// Clock and delay capabilities.
pub mod time;
