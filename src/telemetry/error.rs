//! Error types for telemetry formatting

/// Errors raised while building or decoding a telemetry message.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The value is NaN or infinite and has no JSON representation.
    NonFinite,
    /// A rendered field did not fit its buffer.
    BufferOverflow,
    /// A payload did not match the telemetry schema.
    Malformed,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NonFinite => defmt::write!(f, "NonFinite"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::Malformed => defmt::write!(f, "Malformed"),
        }
    }
}
