//! Common error types for network operations

/// A common error type for network operations.
///
/// Shared by the MQTT client and the host platform's connections. It is
/// designed to be simple and portable for `no_std` environments.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An operation was attempted on a session that is not open.
    NotOpen,
    /// An error occurred during a write operation.
    WriteError,
    /// An error occurred during a read operation.
    ReadError,
    /// The broker refused the connection with the given CONNACK return code.
    ConnectionRefused(u8),
    /// The remote host could not be reached.
    Unreachable,
    /// A timeout occurred.
    Timeout,
    /// The connection was closed.
    ConnectionClosed,
    /// An invalid address was provided.
    InvalidAddress,
    /// A packet did not fit its buffer.
    BufferOverflow,
    /// A protocol-specific error occurred.
    ProtocolError,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotOpen => defmt::write!(f, "NotOpen"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::ConnectionRefused(code) => defmt::write!(f, "ConnectionRefused({=u8})", code),
            Error::Unreachable => defmt::write!(f, "Unreachable"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::InvalidAddress => defmt::write!(f, "InvalidAddress"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::ProtocolError => defmt::write!(f, "ProtocolError"),
        }
    }
}
