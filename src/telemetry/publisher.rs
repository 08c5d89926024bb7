//! Wire format of temperature reports.
//!
//! Topic: `sensor/{device}/data`
//!
//! Payload: `{"metric":"temperature","value":23.45}`, the value always
//! rendered with exactly two decimals.

use core::fmt::Write as _;

use heapless::String;
use serde::Deserialize;

use super::error::Error;
use crate::config::{DeviceId, MAX_DEVICE_ID_DIGITS};

/// Name of the only metric a node reports.
pub const METRIC: &str = "temperature";

const TOPIC_PREFIX: &str = "sensor/";
const TOPIC_SUFFIX: &str = "/data";
const PAYLOAD_PREFIX: &str = "{\"metric\":\"temperature\",\"value\":";
const PAYLOAD_SUFFIX: &str = "}";

/// Widest `{:.2}` rendering of a finite `f32`: sign, 39 integer digits,
/// point and two decimals.
const MAX_VALUE_WIDTH: usize = 43;

/// Capacity of a rendered topic.
pub const TOPIC_CAPACITY: usize = 32;

/// Capacity of a rendered payload.
pub const PAYLOAD_CAPACITY: usize = 80;

const _: () =
    assert!(TOPIC_PREFIX.len() + MAX_DEVICE_ID_DIGITS + TOPIC_SUFFIX.len() <= TOPIC_CAPACITY);
const _: () =
    assert!(PAYLOAD_PREFIX.len() + MAX_VALUE_WIDTH + PAYLOAD_SUFFIX.len() <= PAYLOAD_CAPACITY);

/// A telemetry message ready to hand to the broker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryMessage {
    topic: String<TOPIC_CAPACITY>,
    payload: String<PAYLOAD_CAPACITY>,
}

impl TelemetryMessage {
    /// Topic to publish on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// JSON payload.
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Builds the message reporting `temperature_c` for `device`.
///
/// ```rust
/// use thermonode::config::DeviceId;
/// use thermonode::telemetry::publisher;
///
/// let message = publisher::format(DeviceId::new(42), 23.45).unwrap();
/// assert_eq!(message.topic(), "sensor/42/data");
/// assert_eq!(message.payload(), r#"{"metric":"temperature","value":23.45}"#);
/// ```
///
/// # Errors
///
/// * [`Error::NonFinite`] - `temperature_c` is NaN or infinite
/// * [`Error::BufferOverflow`] - unreachable with the compiled capacities
pub fn format(device: DeviceId, temperature_c: f32) -> Result<TelemetryMessage, Error> {
    if !temperature_c.is_finite() {
        return Err(Error::NonFinite);
    }

    let mut topic = String::new();
    write!(topic, "{}{}{}", TOPIC_PREFIX, device.get(), TOPIC_SUFFIX)
        .map_err(|_| Error::BufferOverflow)?;

    let mut payload = String::new();
    write!(
        payload,
        "{}{:.2}{}",
        PAYLOAD_PREFIX, temperature_c, PAYLOAD_SUFFIX
    )
    .map_err(|_| Error::BufferOverflow)?;

    Ok(TelemetryMessage { topic, payload })
}

/// A decoded telemetry payload.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reading<'a> {
    /// Metric name; always [`METRIC`] once validated by [`parse_payload`].
    pub metric: &'a str,
    /// Reported value.
    pub value: f32,
}

/// Decodes a payload produced by [`format`].
///
/// Used on the receiving side to validate reports.
///
/// # Errors
///
/// [`Error::Malformed`] if the payload is not a JSON object with exactly the
/// keys `metric` and `value`, or if the metric is not [`METRIC`].
pub fn parse_payload(payload: &str) -> Result<Reading<'_>, Error> {
    let (reading, _) =
        serde_json_core::from_str::<Reading>(payload).map_err(|_| Error::Malformed)?;
    if reading.metric != METRIC {
        return Err(Error::Malformed);
    }
    Ok(reading)
}
