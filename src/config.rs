//! Node configuration.
//!
//! Everything a node needs to know about itself is fixed when the firmware is
//! built: its identity, the network it joins, the broker it reports to and
//! the calibration of its thermistor. None of it is mutable at runtime; each
//! component receives the values it needs at construction.
//!
//! # Build-time configuration
//!
//! [`NodeConfig::from_build_env`] reads the following variables, captured by
//! `option_env!` when the crate is compiled:
//!
//! | Variable                      | Meaning                          | Required |
//! |-------------------------------|----------------------------------|----------|
//! | `THERMONODE_DEVICE_ID`        | decimal device identifier        | yes      |
//! | `THERMONODE_WIFI_SSID`        | network name                     | yes      |
//! | `THERMONODE_WIFI_PASSPHRASE`  | network passphrase               | no       |
//! | `THERMONODE_BROKER_HOST`      | broker host name or IP address   | yes      |
//! | `THERMONODE_BROKER_PORT`      | broker TCP port (default 1883)   | no       |
//! | `THERMONODE_BROKER_USER`      | broker user name                 | no       |
//! | `THERMONODE_BROKER_PASSWORD`  | broker password                  | no       |
//!
//! ```rust
//! use thermonode::config::{DeviceId, NodeConfig};
//!
//! let config = NodeConfig::from_lookup(|key| match key {
//!     "THERMONODE_DEVICE_ID" => Some("42"),
//!     "THERMONODE_WIFI_SSID" => Some("greenhouse"),
//!     "THERMONODE_BROKER_HOST" => Some("192.168.1.104"),
//!     _ => None,
//! })
//! .unwrap();
//!
//! assert_eq!(config.device, DeviceId::new(42));
//! assert_eq!(config.broker.port, 1883);
//! ```

use core::fmt::Write as _;
use core::str::FromStr;

use heapless::String;

use crate::sensor::ThermistorConfig;

/// Interval between two sampling cycles, in milliseconds.
pub const SAMPLE_INTERVAL_MS: u64 = 10_000;

/// Delay between two checks of the network link while associating.
pub const NETWORK_POLL_DELAY_MS: u32 = 500;

/// Backoff between two broker handshake attempts.
pub const BROKER_RETRY_DELAY_MS: u32 = 5_000;

/// Default MQTT port.
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Default MQTT keep-alive, in seconds.
pub const DEFAULT_KEEP_ALIVE_SECONDS: u16 = 15;

/// Widest decimal rendering of a [`DeviceId`].
pub const MAX_DEVICE_ID_DIGITS: usize = 10;

/// Prefix of the broker client identifier.
pub const CLIENT_ID_PREFIX: &str = "sensor-client-";

/// Capacity of a rendered client identifier.
pub const CLIENT_ID_CAPACITY: usize = 32;

const _: () = assert!(CLIENT_ID_PREFIX.len() + MAX_DEVICE_ID_DIGITS <= CLIENT_ID_CAPACITY);

/// Configuration errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// A required setting was not provided.
    Missing(&'static str),
    /// The device identifier is not a decimal `u32` without leading zeros.
    InvalidDeviceId,
    /// The broker port is not a valid non-zero `u16`.
    InvalidPort,
    /// A rendered identifier did not fit its buffer.
    Capacity,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Missing(key) => defmt::write!(f, "Missing({=str})", key),
            Error::InvalidDeviceId => defmt::write!(f, "InvalidDeviceId"),
            Error::InvalidPort => defmt::write!(f, "InvalidPort"),
            Error::Capacity => defmt::write!(f, "Capacity"),
        }
    }
}

/// Identity of a physical node.
///
/// Assigned out-of-band and unique per node. It appears on the wire in
/// decimal, without leading zeros, in both the publish topic and the broker
/// client identifier.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Wraps a raw identifier.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Renders the broker client identifier, `sensor-client-{id}`.
    pub fn client_id(self) -> Result<String<CLIENT_ID_CAPACITY>, Error> {
        let mut id = String::new();
        write!(id, "{}{}", CLIENT_ID_PREFIX, self.0).map_err(|_| Error::Capacity)?;
        Ok(id)
    }
}

impl core::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidDeviceId);
        }
        if s.len() > 1 && s.starts_with('0') {
            return Err(Error::InvalidDeviceId);
        }
        s.parse::<u32>()
            .map(DeviceId)
            .map_err(|_| Error::InvalidDeviceId)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=u32}", self.0)
    }
}

/// Credentials of the wireless network the node joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WifiCredentials<'a> {
    /// Network name.
    pub ssid: &'a str,
    /// Passphrase; empty for an open network.
    pub passphrase: &'a str,
}

/// Address and authentication of the MQTT broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerConfig<'a> {
    /// Host name or IP address.
    pub host: &'a str,
    /// TCP port.
    pub port: u16,
    /// User name, if the broker requires authentication.
    pub username: Option<&'a str>,
    /// Password; only sent together with a user name.
    pub password: Option<&'a str>,
    /// Keep-alive interval negotiated in the handshake.
    pub keep_alive_seconds: u16,
}

impl<'a> BrokerConfig<'a> {
    /// Broker at `host` on the default port, without authentication.
    pub const fn new(host: &'a str) -> Self {
        Self {
            host,
            port: DEFAULT_BROKER_PORT,
            username: None,
            password: None,
            keep_alive_seconds: DEFAULT_KEEP_ALIVE_SECONDS,
        }
    }

    /// Sets the port.
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets user name and password.
    pub const fn with_credentials(mut self, username: &'a str, password: &'a str) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }
}

/// Complete configuration of a node.
#[derive(Debug, Clone, Copy)]
pub struct NodeConfig<'a> {
    /// Node identity.
    pub device: DeviceId,
    /// Network credentials.
    pub wifi: WifiCredentials<'a>,
    /// Broker address and authentication.
    pub broker: BrokerConfig<'a>,
    /// Thermistor calibration.
    pub thermistor: ThermistorConfig,
}

impl<'a> NodeConfig<'a> {
    /// Builds a configuration from a key lookup.
    ///
    /// The lookup receives the `THERMONODE_*` variable names listed in the
    /// module documentation. The thermistor calibration is always
    /// [`ThermistorConfig::DEFAULT`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let required = |key: &'static str| lookup(key).ok_or(Error::Missing(key));

        let device = required("THERMONODE_DEVICE_ID")?.parse()?;
        let wifi = WifiCredentials {
            ssid: required("THERMONODE_WIFI_SSID")?,
            passphrase: lookup("THERMONODE_WIFI_PASSPHRASE").unwrap_or(""),
        };

        let port = match lookup("THERMONODE_BROKER_PORT") {
            Some(port) => match port.trim().parse::<u16>() {
                Ok(0) | Err(_) => return Err(Error::InvalidPort),
                Ok(port) => port,
            },
            None => DEFAULT_BROKER_PORT,
        };

        let mut broker = BrokerConfig::new(required("THERMONODE_BROKER_HOST")?).with_port(port);
        broker.username = lookup("THERMONODE_BROKER_USER");
        broker.password = lookup("THERMONODE_BROKER_PASSWORD");

        Ok(Self {
            device,
            wifi,
            broker,
            thermistor: ThermistorConfig::DEFAULT,
        })
    }
}

impl NodeConfig<'static> {
    /// Builds the configuration baked in at compile time.
    pub fn from_build_env() -> Result<Self, Error> {
        Self::from_lookup(|key| match key {
            "THERMONODE_DEVICE_ID" => option_env!("THERMONODE_DEVICE_ID"),
            "THERMONODE_WIFI_SSID" => option_env!("THERMONODE_WIFI_SSID"),
            "THERMONODE_WIFI_PASSPHRASE" => option_env!("THERMONODE_WIFI_PASSPHRASE"),
            "THERMONODE_BROKER_HOST" => option_env!("THERMONODE_BROKER_HOST"),
            "THERMONODE_BROKER_PORT" => option_env!("THERMONODE_BROKER_PORT"),
            "THERMONODE_BROKER_USER" => option_env!("THERMONODE_BROKER_USER"),
            "THERMONODE_BROKER_PASSWORD" => option_env!("THERMONODE_BROKER_PASSWORD"),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(key: &str) -> Option<&'static str> {
        match key {
            "THERMONODE_DEVICE_ID" => Some("42"),
            "THERMONODE_WIFI_SSID" => Some("TP-Link_61E3_2.4"),
            "THERMONODE_WIFI_PASSPHRASE" => Some("secret"),
            "THERMONODE_BROKER_HOST" => Some("192.168.1.104"),
            "THERMONODE_BROKER_PORT" => Some("1884"),
            "THERMONODE_BROKER_USER" => Some("admin"),
            "THERMONODE_BROKER_PASSWORD" => Some("admin1234"),
            _ => None,
        }
    }

    #[test]
    fn test_client_id() {
        assert_eq!(DeviceId::new(42).client_id().unwrap().as_str(), "sensor-client-42");
        assert_eq!(
            DeviceId::new(u32::MAX).client_id().unwrap().as_str(),
            "sensor-client-4294967295"
        );
    }

    #[test]
    fn test_device_id_parse() {
        assert_eq!("42".parse::<DeviceId>(), Ok(DeviceId::new(42)));
        assert_eq!("0".parse::<DeviceId>(), Ok(DeviceId::new(0)));
        assert_eq!("042".parse::<DeviceId>(), Err(Error::InvalidDeviceId));
        assert_eq!("-1".parse::<DeviceId>(), Err(Error::InvalidDeviceId));
        assert_eq!("4294967296".parse::<DeviceId>(), Err(Error::InvalidDeviceId));
        assert_eq!("".parse::<DeviceId>(), Err(Error::InvalidDeviceId));
    }

    #[test]
    fn test_from_lookup() {
        let config = NodeConfig::from_lookup(full).unwrap();
        assert_eq!(config.device, DeviceId::new(42));
        assert_eq!(config.wifi.ssid, "TP-Link_61E3_2.4");
        assert_eq!(config.wifi.passphrase, "secret");
        assert_eq!(config.broker.host, "192.168.1.104");
        assert_eq!(config.broker.port, 1884);
        assert_eq!(config.broker.username, Some("admin"));
        assert_eq!(config.broker.password, Some("admin1234"));
        assert_eq!(config.broker.keep_alive_seconds, DEFAULT_KEEP_ALIVE_SECONDS);
    }

    #[test]
    fn test_from_lookup_missing_host() {
        let result = NodeConfig::from_lookup(|key| match key {
            "THERMONODE_BROKER_HOST" => None,
            other => full(other),
        });
        assert_eq!(result.unwrap_err(), Error::Missing("THERMONODE_BROKER_HOST"));
    }

    #[test]
    fn test_from_lookup_bad_port() {
        for port in ["0", "65536", "mqtt"] {
            let result = NodeConfig::from_lookup(|key| match key {
                "THERMONODE_BROKER_PORT" => Some(port),
                other => full(other),
            });
            assert_eq!(result.unwrap_err(), Error::InvalidPort);
        }
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = NodeConfig::from_lookup(|key| match key {
            "THERMONODE_DEVICE_ID" => Some("7"),
            "THERMONODE_WIFI_SSID" => Some("lab"),
            "THERMONODE_BROKER_HOST" => Some("broker.local"),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.wifi.passphrase, "");
        assert_eq!(config.broker.port, DEFAULT_BROKER_PORT);
        assert_eq!(config.broker.username, None);
    }
}
