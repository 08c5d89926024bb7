//! Capabilities for nodes running a full operating system.
//!
//! Linux-class boards (Raspberry Pi and the like) join the network through
//! the OS, keep time with [`std::time::Instant`] and reach the broker over
//! [`std::net::TcpStream`].

use std::io::{ErrorKind, Read as _, Write as _};
use std::net::{Ipv4Addr, TcpStream};
use std::time::{Duration, Instant};

use crate::config::WifiCredentials;
use crate::network::error::Error;
use crate::network::{Close, Connect, Connection, Interface, Read, Write};
use crate::time::{Clock, Delay};

/// Read timeout applied to broker connections.
///
/// Bounds how long a poll of an idle connection stalls the control loop. A
/// handshake or a partly received packet waits up to
/// [`MAX_STALLED_READS`](crate::network::mqtt::client::MAX_STALLED_READS)
/// timeouts.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Monotonic clock counting from its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Starts a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Delay that puts the calling thread to sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Network interface managed by the operating system.
///
/// The OS owns association, so [`Interface::begin`] has nothing to do and
/// the link is always reported up.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostInterface {
    address: Option<Ipv4Addr>,
}

impl HostInterface {
    /// An interface reporting `address` as the node's address.
    pub fn with_address(address: Ipv4Addr) -> Self {
        Self {
            address: Some(address),
        }
    }
}

impl Interface for HostInterface {
    type Error = Error;

    fn begin(&mut self, _credentials: &WifiCredentials<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn is_up(&mut self) -> bool {
        true
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.address
    }
}

/// Opens TCP connections with a read timeout.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnector {
    read_timeout: Duration,
}

impl TcpConnector {
    /// A connector using `read_timeout` on every connection.
    pub fn new(read_timeout: Duration) -> Self {
        Self { read_timeout }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_READ_TIMEOUT)
    }
}

impl Connect for TcpConnector {
    type Connection = TcpConnection;
    type Error = Error;

    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error> {
        let stream = TcpStream::connect(remote).map_err(|e| match e.kind() {
            ErrorKind::InvalidInput => Error::InvalidAddress,
            ErrorKind::TimedOut => Error::Timeout,
            _ => Error::Unreachable,
        })?;
        stream
            .set_read_timeout(Some(self.read_timeout))
            .map_err(|_| Error::NotOpen)?;
        stream.set_nodelay(true).map_err(|_| Error::NotOpen)?;
        Ok(TcpConnection { stream })
    }
}

/// A TCP connection to the broker.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
}

impl Read for TcpConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.stream.read(buf) {
            Ok(0) if !buf.is_empty() => Err(Error::ConnectionClosed),
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(0),
            Err(_) => Err(Error::ReadError),
        }
    }
}

impl Write for TcpConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf).map_err(|_| Error::WriteError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().map_err(|_| Error::WriteError)
    }
}

impl Close for TcpConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        self.stream
            .shutdown(std::net::Shutdown::Both)
            .map_err(|_| Error::ConnectionClosed)
    }
}

impl Connection for TcpConnection {}
