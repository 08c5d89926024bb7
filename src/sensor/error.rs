//! Error types for sensor sampling and conversion

/// Why a sample could not be turned into a temperature.
///
/// Every variant is deterministic for a given raw code; the caller skips the
/// tick and samples again on the next one.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The divider voltage is below the noise floor: the thermistor is
    /// disconnected or open.
    OpenCircuit,
    /// The raw code exceeds the converter's full-scale value.
    OutOfRange,
    /// The voltage falls outside the divider model: the computed resistance
    /// or absolute temperature is not physical.
    Implausible,
    /// The analog input could not be read.
    ReadError,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::OpenCircuit => defmt::write!(f, "OpenCircuit"),
            Error::OutOfRange => defmt::write!(f, "OutOfRange"),
            Error::Implausible => defmt::write!(f, "Implausible"),
            Error::ReadError => defmt::write!(f, "ReadError"),
        }
    }
}
