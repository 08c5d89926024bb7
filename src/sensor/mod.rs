//! # NTC thermistor sampling and conversion
//!
//! The node measures temperature with an NTC thermistor wired as one leg of a
//! voltage divider against a fixed series resistor. The ADC reports the
//! divider voltage as a raw code; this module turns that code into degrees
//! Celsius.
//!
//! # Conversion
//!
//! ```text
//! voltage    = raw × (V_ref / max_code)
//! resistance = R_fixed × (1 / voltage − 1)
//! 1 / T      = 1 / T0 + ln(resistance / R0) / β
//! celsius    = T − 273.15
//! ```
//!
//! A voltage below the noise floor means the sensor is disconnected and is
//! reported as [`Error::OpenCircuit`] instead of dividing by almost zero.
//!
//! # Example
//!
//! ```rust
//! use thermonode::sensor::{Thermistor, ThermistorConfig};
//!
//! let thermistor = Thermistor::new(ThermistorConfig::DEFAULT);
//!
//! let celsius = thermistor.convert(100).unwrap();
//! assert!((celsius - 32.08).abs() < 0.05);
//!
//! assert!(thermistor.convert(0).is_err());
//! ```

#![deny(unsafe_code)]

/// Error types for sampling and conversion
pub mod error;

pub use error::Error;

/// A source of raw analog samples.
///
/// Implemented by the platform's ADC driver. One call yields one conversion.
pub trait AnalogInput {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read one raw sample
    fn read(&mut self) -> Result<u16, Self::Error>;
}

/// Calibration of the divider circuit and the thermistor.
///
/// Fixed when the firmware is built. The defaults are the calibration of the
/// deployed nodes and are kept as given, even though they differ from common
/// datasheet curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermistorConfig {
    /// ADC reference voltage, in volts.
    pub reference_voltage: f32,
    /// Full-scale ADC code.
    pub max_code: u16,
    /// Voltages below this are treated as an open circuit.
    pub noise_floor_volts: f32,
    /// Fixed resistor of the divider, in ohms.
    pub series_resistor_ohms: f32,
    /// β coefficient of the thermistor, in kelvin.
    pub beta: f32,
    /// Reference temperature T0, in kelvin.
    pub nominal_temperature_k: f32,
    /// Thermistor resistance at T0, in ohms.
    pub nominal_resistance_ohms: f32,
}

impl ThermistorConfig {
    /// Calibration of the deployed sensor nodes.
    pub const DEFAULT: Self = Self {
        reference_voltage: 3.3,
        max_code: 1023,
        noise_floor_volts: 0.01,
        series_resistor_ohms: 100_000.0,
        beta: 3700.0,
        nominal_temperature_k: 298.15,
        nominal_resistance_ohms: 280_000.0,
    };
}

impl Default for ThermistorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Offset between kelvin and degrees Celsius.
pub const KELVIN_OFFSET: f32 = 273.15;

/// One sample with the intermediate values of its conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    /// Raw ADC code.
    pub raw_code: u16,
    /// Divider voltage, in volts.
    pub voltage: f32,
    /// Computed thermistor resistance, in ohms. Meaningless when the voltage
    /// is below the noise floor.
    pub resistance_ohms: f32,
    /// Converted temperature.
    pub temperature_c: Result<f32, Error>,
}

/// Converter from raw ADC codes to degrees Celsius.
#[derive(Debug, Clone, Copy)]
pub struct Thermistor {
    config: ThermistorConfig,
}

impl Thermistor {
    /// Creates a converter for the given calibration.
    pub const fn new(config: ThermistorConfig) -> Self {
        Self { config }
    }

    /// Returns the calibration in use.
    pub fn config(&self) -> &ThermistorConfig {
        &self.config
    }

    /// Converts a raw code to degrees Celsius.
    ///
    /// # Errors
    ///
    /// * [`Error::OutOfRange`] - the code exceeds `max_code`
    /// * [`Error::OpenCircuit`] - the voltage is below the noise floor
    /// * [`Error::Implausible`] - the voltage is outside the divider model
    pub fn convert(&self, raw: u16) -> Result<f32, Error> {
        self.measure(raw).temperature_c
    }

    /// Converts a raw code and keeps the intermediate values.
    pub fn measure(&self, raw: u16) -> SensorSample {
        let voltage = self.voltage(raw);
        let resistance_ohms = self.resistance(voltage);
        let temperature_c = if raw > self.config.max_code {
            Err(Error::OutOfRange)
        } else {
            self.convert_voltage(voltage)
        };

        SensorSample {
            raw_code: raw,
            voltage,
            resistance_ohms,
            temperature_c,
        }
    }

    /// Converts a divider voltage to degrees Celsius.
    pub fn convert_voltage(&self, voltage: f32) -> Result<f32, Error> {
        if !(voltage >= self.config.noise_floor_volts) {
            return Err(Error::OpenCircuit);
        }
        self.temperature_from_resistance(self.resistance(voltage))
    }

    /// Applies the β model to a thermistor resistance.
    pub fn temperature_from_resistance(&self, resistance_ohms: f32) -> Result<f32, Error> {
        if !(resistance_ohms > 0.0) || !resistance_ohms.is_finite() {
            return Err(Error::Implausible);
        }

        let c = &self.config;
        let inverse_kelvin = 1.0 / c.nominal_temperature_k
            + (1.0 / c.beta) * libm::logf(resistance_ohms / c.nominal_resistance_ohms);
        if !(inverse_kelvin > 0.0) {
            return Err(Error::Implausible);
        }

        let celsius = 1.0 / inverse_kelvin - KELVIN_OFFSET;
        if celsius.is_finite() {
            Ok(celsius)
        } else {
            Err(Error::Implausible)
        }
    }

    fn voltage(&self, raw: u16) -> f32 {
        raw as f32 * (self.config.reference_voltage / self.config.max_code as f32)
    }

    fn resistance(&self, voltage: f32) -> f32 {
        self.config.series_resistor_ohms * ((1.0 / voltage) - 1.0)
    }
}

impl Default for Thermistor {
    fn default() -> Self {
        Self::new(ThermistorConfig::DEFAULT)
    }
}
