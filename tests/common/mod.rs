//! Simulated capabilities shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::rc::Rc;

use thermonode::config::WifiCredentials;
use thermonode::connectivity::BrokerSession;
use thermonode::network::error::Error;
use thermonode::network::{Close, Connect, Connection, Interface, Read, Write};
use thermonode::sensor::AnalogInput;
use thermonode::time::{Clock, Delay};

pub const WIFI: WifiCredentials<'static> = WifiCredentials {
    ssid: "greenhouse",
    passphrase: "secret",
};

/// Millisecond clock advanced by hand or by [`SimDelay`].
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// A delay that moves this clock forward instead of sleeping.
    pub fn delay(&self) -> SimDelay {
        SimDelay {
            now: self.now.clone(),
            recorded: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[derive(Debug, Clone)]
pub struct SimDelay {
    now: Rc<Cell<u64>>,
    recorded: Rc<RefCell<Vec<u32>>>,
}

impl SimDelay {
    /// Every delay requested so far, in order.
    pub fn recorded(&self) -> Vec<u32> {
        self.recorded.borrow().clone()
    }
}

impl Delay for SimDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.recorded.borrow_mut().push(ms);
        self.now.set(self.now.get() + u64::from(ms));
    }
}

/// Wireless station that comes up `polls_until_up` polls after a successful
/// `begin`.
#[derive(Debug, Default)]
pub struct MockInterface {
    pub failing_begins: u32,
    pub polls_until_up: u32,
    pub begin_calls: u32,
    /// Set to take the link down at the next `is_up` check.
    pub carrier_lost: Rc<Cell<bool>>,
    pub joined: bool,
    pub up: bool,
}

impl MockInterface {
    /// Simulates the access point going away.
    pub fn drop_link(&mut self) {
        self.joined = false;
        self.up = false;
    }
}

impl Interface for MockInterface {
    type Error = &'static str;

    fn begin(&mut self, _credentials: &WifiCredentials<'_>) -> Result<(), Self::Error> {
        self.begin_calls += 1;
        if self.failing_begins > 0 {
            self.failing_begins -= 1;
            return Err("association rejected");
        }
        self.joined = true;
        Ok(())
    }

    fn is_up(&mut self) -> bool {
        if self.carrier_lost.take() {
            self.drop_link();
        }
        if self.joined && !self.up {
            if self.polls_until_up == 0 {
                self.up = true;
            } else {
                self.polls_until_up -= 1;
            }
        }
        self.up
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.up.then(|| Ipv4Addr::new(192, 168, 1, 50))
    }
}

/// Broker session that records everything asked of it.
#[derive(Debug, Default)]
pub struct MockSession {
    pub refusals: u32,
    pub connected: bool,
    pub fail_publish: bool,
    pub connect_calls: Vec<String>,
    pub published: Vec<(String, String)>,
    pub service_calls: Vec<u64>,
    pub disconnects: u32,
    /// Carrier of the interface, lost whenever a handshake is refused.
    pub carrier_on_refusal: Option<Rc<Cell<bool>>>,
}

impl BrokerSession for MockSession {
    type Error = &'static str;

    fn connect(&mut self, client_id: &str) -> Result<(), Self::Error> {
        self.connect_calls.push(client_id.to_string());
        if self.refusals > 0 {
            self.refusals -= 1;
            self.connected = false;
            if let Some(carrier_lost) = &self.carrier_on_refusal {
                carrier_lost.set(true);
            }
            return Err("connection refused");
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
        if self.fail_publish {
            return Err("write failed");
        }
        let payload = String::from_utf8(payload.to_vec()).map_err(|_| "not utf-8")?;
        self.published.push((topic.to_string(), payload));
        Ok(())
    }

    fn service(&mut self, now_ms: u64) -> Result<(), Self::Error> {
        self.service_calls.push(now_ms);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.disconnects += 1;
    }
}

/// ADC returning a fixed code.
#[derive(Debug, Default)]
pub struct MockAdc {
    pub code: u16,
    pub fail: bool,
    pub reads: u32,
}

impl MockAdc {
    pub fn with_code(code: u16) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }
}

impl AnalogInput for MockAdc {
    type Error = &'static str;

    fn read(&mut self) -> Result<u16, Self::Error> {
        self.reads += 1;
        if self.fail {
            return Err("conversion timed out");
        }
        Ok(self.code)
    }
}

/// Both directions of a simulated TCP stream.
#[derive(Debug, Default)]
pub struct Wire {
    pub inbound: VecDeque<u8>,
    pub outbound: Vec<u8>,
    pub fail_writes: bool,
    pub closed: bool,
    /// Reads that find nothing before inbound bytes are delivered.
    pub stalled_reads: u32,
}

impl Wire {
    pub fn shared() -> Rc<RefCell<Wire>> {
        Rc::new(RefCell::new(Wire::default()))
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }
}

pub const CONNACK_ACCEPTED: [u8; 4] = [0x20, 0x02, 0x00, 0x00];

#[derive(Debug)]
pub struct MockConnection {
    wire: Rc<RefCell<Wire>>,
}

impl MockConnection {
    pub fn new(wire: &Rc<RefCell<Wire>>) -> Self {
        Self { wire: wire.clone() }
    }
}

impl Read for MockConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut wire = self.wire.borrow_mut();
        if wire.closed {
            return Err(Error::NotOpen);
        }
        if wire.stalled_reads > 0 {
            wire.stalled_reads -= 1;
            return Ok(0);
        }
        let len = buf.len().min(wire.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(wire.inbound.drain(..len)) {
            *slot = byte;
        }
        Ok(len)
    }
}

impl Write for MockConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut wire = self.wire.borrow_mut();
        if wire.closed {
            return Err(Error::NotOpen);
        }
        if wire.fail_writes {
            return Err(Error::WriteError);
        }
        wire.outbound.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for MockConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        self.wire.borrow_mut().closed = true;
        Ok(())
    }
}

impl Connection for MockConnection {}

/// Connector handing out connections over one shared [`Wire`].
#[derive(Debug)]
pub struct MockConnector {
    pub wire: Rc<RefCell<Wire>>,
    pub remotes: Vec<String>,
    pub unreachable: bool,
}

impl MockConnector {
    pub fn new(wire: &Rc<RefCell<Wire>>) -> Self {
        Self {
            wire: wire.clone(),
            remotes: Vec::new(),
            unreachable: false,
        }
    }
}

impl Connect for MockConnector {
    type Connection = MockConnection;
    type Error = Error;

    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error> {
        self.remotes.push(remote.to_string());
        if self.unreachable {
            return Err(Error::Unreachable);
        }
        self.wire.borrow_mut().closed = false;
        Ok(MockConnection::new(&self.wire))
    }
}
