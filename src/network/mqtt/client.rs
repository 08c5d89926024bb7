//! An MQTT 3.1.1 client for publishing nodes.
use crate::network::error::Error;
use crate::network::{Close, Connection, Read, Write};
use heapless::Vec;

// MQTT Control Packet types - these are the fixed header packet type values
/// MQTT CONNECT packet type identifier.
const CONNECT: u8 = 0x10;
/// MQTT CONNACK packet type identifier.
const CONNACK: u8 = 0x20;
/// MQTT PUBLISH packet type identifier.
const PUBLISH: u8 = 0x30;
/// MQTT PINGREQ packet type identifier.
const PINGREQ: u8 = 0xC0;
/// MQTT PINGRESP packet type identifier.
const PINGRESP: u8 = 0xD0;
/// MQTT DISCONNECT packet type identifier.
const DISCONNECT: u8 = 0xE0;

// Protocol constants defined by MQTT 3.1.1 specification
/// MQTT protocol name as defined in the specification.
const PROTOCOL_NAME: &[u8] = b"MQTT";
/// MQTT protocol level for version 3.1.1.
const PROTOCOL_LEVEL: u8 = 4;

// CONNECT flags
const FLAG_CLEAN_SESSION: u8 = 0x02;
const FLAG_PASSWORD: u8 = 0x40;
const FLAG_USERNAME: u8 = 0x80;

/// Largest PUBLISH body (topic + payload) the client will send.
pub const MAX_PACKET_SIZE: usize = 256;

/// Consecutive empty reads tolerated while a packet is partly received.
///
/// Only the first byte of a packet may find the connection idle; once a
/// handshake or packet is under way, the rest is waited for. The deadline is
/// this count times the connection's read timeout (5 s on the host).
pub const MAX_STALLED_READS: u32 = 100;

/// Configuration options for the MQTT handshake.
///
/// # Examples
///
/// ```rust
/// use thermonode::network::mqtt::Options;
///
/// let options = Options {
///     client_id: "sensor-client-42",
///     username: Some("admin"),
///     password: Some("admin1234"),
///     keep_alive_seconds: 15,
///     clean_session: true,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Options<'a> {
    /// The client identifier, must be unique within the broker.
    pub client_id: &'a str,
    /// User name, if the broker requires authentication.
    pub username: Option<&'a str>,
    /// Password. MQTT 3.1.1 only allows it together with a user name.
    pub password: Option<&'a str>,
    /// The keep-alive time interval in seconds; 0 disables keep-alive.
    pub keep_alive_seconds: u16,
    /// Whether the broker should discard previous session state.
    pub clean_session: bool,
}

/// A control packet received from the broker.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Incoming {
    /// Response to a PINGREQ.
    PingResp,
    /// Any other packet; its body has been discarded.
    Other(u8),
}

/// An MQTT 3.1.1 client.
///
/// Publishes at QoS 0 and keeps the session alive with PINGREQ. Works over
/// any connection implementing [`Connection`].
pub struct Client<C: Connection> {
    connection: C,
    is_connected: bool,
}

impl<C: Connection> Client<C> {
    /// Establish an MQTT connection with the broker.
    ///
    /// Sends a CONNECT packet and waits for the CONNACK.
    ///
    /// # Errors
    ///
    /// * [`Error::WriteError`] - Failed to send CONNECT packet
    /// * [`Error::ReadError`] - Failed to read CONNACK response
    /// * [`Error::Timeout`] - No CONNACK arrived within [`MAX_STALLED_READS`] reads
    /// * [`Error::ConnectionRefused`] - Broker refused the connection; carries the return code
    /// * [`Error::BufferOverflow`] - Client id or credentials too long
    /// * [`Error::ProtocolError`] - Invalid CONNACK packet received
    ///
    /// The return codes the broker may refuse with:
    /// 1. unacceptable protocol version
    /// 2. identifier rejected
    /// 3. server unavailable
    /// 4. bad user name or password
    /// 5. not authorized
    pub fn connect(mut connection: C, options: Options) -> Result<Self, Error> {
        // --- Variable Header ---
        let mut vh: Vec<u8, 10> = Vec::new();
        push_bytes(&mut vh, &(PROTOCOL_NAME.len() as u16).to_be_bytes())?;
        push_bytes(&mut vh, PROTOCOL_NAME)?;
        push_bytes(&mut vh, &[PROTOCOL_LEVEL])?;

        let mut connect_flags = 0;
        if options.clean_session {
            connect_flags |= FLAG_CLEAN_SESSION;
        }
        if options.username.is_some() {
            connect_flags |= FLAG_USERNAME;
            if options.password.is_some() {
                connect_flags |= FLAG_PASSWORD;
            }
        }
        push_bytes(&mut vh, &[connect_flags])?;
        push_bytes(&mut vh, &options.keep_alive_seconds.to_be_bytes())?;

        // --- Payload ---
        let mut payload: Vec<u8, 256> = Vec::new();
        push_str(&mut payload, options.client_id)?;
        if let Some(username) = options.username {
            push_str(&mut payload, username)?;
            if let Some(password) = options.password {
                push_str(&mut payload, password)?;
            }
        }

        // --- Fixed Header ---
        let mut fixed_header: Vec<u8, 5> = Vec::new();
        push_bytes(&mut fixed_header, &[CONNECT])?;
        encode_remaining_length(&mut fixed_header, vh.len() + payload.len())?;

        write_all(&mut connection, &fixed_header)?;
        write_all(&mut connection, &vh)?;
        write_all(&mut connection, &payload)?;
        connection.flush().map_err(|_| Error::WriteError)?;

        // Wait for and parse CONNACK
        let mut connack_buf = [0u8; 4];
        read_exact(&mut connection, &mut connack_buf)?;

        if connack_buf[0] != CONNACK || connack_buf[1] != 2 {
            return Err(Error::ProtocolError);
        }

        match connack_buf[3] {
            0 => Ok(Self {
                connection,
                is_connected: true,
            }),
            code @ 1..=5 => Err(Error::ConnectionRefused(code)),
            _ => Err(Error::ProtocolError),
        }
    }

    /// Whether the client still considers the session usable.
    ///
    /// Turns `false` after any failed write; the session cannot recover and
    /// must be replaced by a new [`Client::connect`].
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Publish a message at QoS 0.
    ///
    /// # Errors
    ///
    /// * [`Error::NotOpen`] - The session already failed
    /// * [`Error::BufferOverflow`] - Topic and payload exceed [`MAX_PACKET_SIZE`]
    /// * [`Error::WriteError`] - Failed to send the packet; the session is marked closed
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Error> {
        if !self.is_connected {
            return Err(Error::NotOpen);
        }

        // --- Variable Header ---
        let mut packet: Vec<u8, MAX_PACKET_SIZE> = Vec::new();
        push_str(&mut packet, topic)?;

        // --- Payload ---
        push_bytes(&mut packet, payload)?;

        // --- Fixed Header ---
        let mut fixed_header: Vec<u8, 5> = Vec::new();
        push_bytes(&mut fixed_header, &[PUBLISH])?;
        encode_remaining_length(&mut fixed_header, packet.len())?;

        self.send(&fixed_header)?;
        self.send(&packet)?;
        self.flush()
    }

    /// Send a PINGREQ.
    pub fn ping(&mut self) -> Result<(), Error> {
        if !self.is_connected {
            return Err(Error::NotOpen);
        }
        self.send(&[PINGREQ, 0x00])?;
        self.flush()
    }

    /// Poll the connection for one incoming control packet.
    ///
    /// Returns `Ok(None)` when nothing is pending. Packet bodies other than
    /// PINGRESP are read and discarded; a publishing node has no use for them.
    pub fn poll(&mut self) -> Result<Option<Incoming>, Error> {
        if !self.is_connected {
            return Err(Error::NotOpen);
        }

        let mut header_buf = [0u8; 1];
        match self.connection.read(&mut header_buf) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            Err(_) => {
                self.is_connected = false;
                return Err(Error::ReadError);
            }
        }

        let remaining_len = self.read_remaining_length()?;
        let mut discard = [0u8; 32];
        let mut left = remaining_len;
        while left > 0 {
            let chunk = left.min(discard.len());
            self.read_body(&mut discard[..chunk])?;
            left -= chunk;
        }

        match header_buf[0] & 0xF0 {
            PINGRESP => Ok(Some(Incoming::PingResp)),
            other => Ok(Some(Incoming::Other(other))),
        }
    }

    /// Send DISCONNECT and close the connection.
    pub fn disconnect(mut self) -> Result<(), Error> {
        if self.is_connected {
            // The session is ending either way; a failed DISCONNECT changes nothing.
            let _ = self.send(&[DISCONNECT, 0x00]);
            let _ = self.flush();
        }
        self.connection.close().map_err(|_| Error::ConnectionClosed)
    }

    fn send(&mut self, buf: &[u8]) -> Result<(), Error> {
        write_all(&mut self.connection, buf).inspect_err(|_| self.is_connected = false)
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.connection.flush().map_err(|_| {
            self.is_connected = false;
            Error::WriteError
        })
    }

    fn read_body(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        read_exact(&mut self.connection, buf).inspect_err(|_| self.is_connected = false)
    }

    fn read_remaining_length(&mut self) -> Result<usize, Error> {
        let mut remaining_len = 0;
        let mut multiplier = 1;
        for _ in 0..4 {
            let mut byte = [0u8; 1];
            self.read_body(&mut byte)?;
            remaining_len += (byte[0] as usize & 127) * multiplier;
            if byte[0] & 0x80 == 0 {
                return Ok(remaining_len);
            }
            multiplier *= 128;
        }
        self.is_connected = false;
        Err(Error::ProtocolError)
    }
}

impl<C: Connection> core::fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("is_connected", &self.is_connected)
            .finish()
    }
}

fn push_bytes<const N: usize>(buf: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), Error> {
    buf.extend_from_slice(bytes)
        .map_err(|_| Error::BufferOverflow)
}

/// Append a length-prefixed UTF-8 string.
fn push_str<const N: usize>(buf: &mut Vec<u8, N>, s: &str) -> Result<(), Error> {
    let len = u16::try_from(s.len()).map_err(|_| Error::BufferOverflow)?;
    push_bytes(buf, &len.to_be_bytes())?;
    push_bytes(buf, s.as_bytes())
}

fn write_all<C: Write>(connection: &mut C, mut buf: &[u8]) -> Result<(), Error> {
    while !buf.is_empty() {
        match connection.write(buf) {
            Ok(0) | Err(_) => return Err(Error::WriteError),
            Ok(n) => buf = &buf[n..],
        }
    }
    Ok(())
}

/// Reads until `buf` is full. Gives up with [`Error::Timeout`] after
/// [`MAX_STALLED_READS`] empty reads in a row.
fn read_exact<C: Read>(connection: &mut C, buf: &mut [u8]) -> Result<(), Error> {
    let mut total_read = 0;
    let mut stalled = 0;
    while total_read < buf.len() {
        match connection.read(&mut buf[total_read..]) {
            Ok(0) => {
                stalled += 1;
                if stalled >= MAX_STALLED_READS {
                    return Err(Error::Timeout);
                }
            }
            Ok(n) => {
                total_read += n;
                stalled = 0;
            }
            Err(_) => return Err(Error::ReadError),
        }
    }
    Ok(())
}

/// Encode the remaining length field for an MQTT packet.
///
/// Each byte carries 7 bits of the length, least significant group first;
/// the high bit flags a continuation byte. At most 4 bytes are allowed.
fn encode_remaining_length(buf: &mut Vec<u8, 5>, mut len: usize) -> Result<(), Error> {
    for _ in 0..4 {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        buf.push(byte).map_err(|_| Error::BufferOverflow)?;
        if len == 0 {
            return Ok(());
        }
    }
    Err(Error::ProtocolError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_remaining_length() {
        let cases: [(usize, &[u8]); 5] = [
            (0, &[0x00]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (16_383, &[0xFF, 0x7F]),
            (2_097_152, &[0x80, 0x80, 0x80, 0x01]),
        ];
        for (len, expected) in cases {
            let mut buf: Vec<u8, 5> = Vec::new();
            encode_remaining_length(&mut buf, len).unwrap();
            assert_eq!(&buf[..], expected, "length {}", len);
        }
    }

    #[test]
    fn test_encode_remaining_length_too_large() {
        let mut buf: Vec<u8, 5> = Vec::new();
        assert_eq!(
            encode_remaining_length(&mut buf, 268_435_456),
            Err(Error::ProtocolError)
        );
    }

    #[test]
    fn test_push_str() {
        let mut buf: Vec<u8, 8> = Vec::new();
        push_str(&mut buf, "abc").unwrap();
        assert_eq!(&buf[..], &[0x00, 0x03, b'a', b'b', b'c']);
        assert_eq!(push_str(&mut buf, "abc"), Err(Error::BufferOverflow));
    }
}
