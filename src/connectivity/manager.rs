//! Connectivity state machine.

use heapless::String;

use super::{BrokerSession, ConnectionState, Error};
use crate::config::{
    self, BROKER_RETRY_DELAY_MS, CLIENT_ID_CAPACITY, DeviceId, NETWORK_POLL_DELAY_MS,
    WifiCredentials,
};
use crate::fmt::Dbg;
use crate::network::Interface;
use crate::time::Delay;

/// Delays used by the reconnect loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait between two checks of the network link while associating.
    pub network_poll_delay_ms: u32,
    /// Wait between two broker handshake attempts.
    pub broker_retry_delay_ms: u32,
}

impl RetryPolicy {
    /// Delays used by the deployed nodes.
    pub const DEFAULT: Self = Self {
        network_poll_delay_ms: NETWORK_POLL_DELAY_MS,
        broker_retry_delay_ms: BROKER_RETRY_DELAY_MS,
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Owns the network link and the broker session and keeps both up.
///
/// # Type Parameters
///
/// * `I` - the network interface
/// * `S` - the broker session
/// * `D` - the delay used by the reconnect loops
///
/// # Examples
///
/// ```rust,no_run
/// # use thermonode::config::{DeviceId, WifiCredentials};
/// # use thermonode::connectivity::{BrokerSession, ConnectivityManager};
/// # use thermonode::network::Interface;
/// # use thermonode::time::Delay;
/// # fn demo<I: Interface, S: BrokerSession, D: Delay>(interface: I, session: S, delay: D) {
/// let wifi = WifiCredentials { ssid: "greenhouse", passphrase: "secret" };
/// let mut connectivity =
///     ConnectivityManager::new(interface, session, delay, DeviceId::new(42), wifi).unwrap();
///
/// connectivity.ensure_ready();
/// assert!(connectivity.is_ready());
/// let _ = connectivity.publish("sensor/42/data", b"{\"metric\":\"temperature\",\"value\":21.50}");
/// # }
/// ```
pub struct ConnectivityManager<'a, I, S, D>
where
    I: Interface,
    S: BrokerSession,
    D: Delay,
{
    interface: I,
    session: S,
    delay: D,
    wifi: WifiCredentials<'a>,
    client_id: String<CLIENT_ID_CAPACITY>,
    retry: RetryPolicy,
    state: ConnectionState,
}

impl<'a, I, S, D> ConnectivityManager<'a, I, S, D>
where
    I: Interface,
    S: BrokerSession,
    D: Delay,
{
    /// Creates a manager in the [`ConnectionState::Disconnected`] state.
    ///
    /// Nothing is attempted until the first [`ensure_ready`](Self::ensure_ready).
    pub fn new(
        interface: I,
        session: S,
        delay: D,
        device: DeviceId,
        wifi: WifiCredentials<'a>,
    ) -> Result<Self, config::Error> {
        Ok(Self {
            interface,
            session,
            delay,
            wifi,
            client_id: device.client_id()?,
            retry: RetryPolicy::DEFAULT,
            state: ConnectionState::Disconnected,
        })
    }

    /// Replaces the reconnect delays.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a broker session is established. Never blocks.
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::BrokerUp
    }

    /// Client identifier presented to the broker.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The network interface.
    pub fn interface(&self) -> &I {
        &self.interface
    }

    /// The network interface, mutably.
    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// The broker session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// The broker session, mutably.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Blocks until a broker session is established.
    ///
    /// Detects a lost network or a dropped session first, then runs whatever
    /// reconnect work is needed. Retries forever; there is no failure mode.
    pub fn ensure_ready(&mut self) {
        self.check_links();
        while self.state != ConnectionState::BrokerUp {
            self.step();
        }
    }

    /// Sends one message over the broker session.
    ///
    /// The state is left untouched whatever the outcome: a broken session is
    /// noticed by the transport and picked up by the next
    /// [`ensure_ready`](Self::ensure_ready).
    ///
    /// # Errors
    ///
    /// * [`Error::NotReady`] - no broker session; the transport is not called
    /// * [`Error::PublishFailed`] - the transport rejected the message
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Error> {
        if self.state != ConnectionState::BrokerUp {
            return Err(Error::NotReady);
        }
        self.session.publish(topic, payload).map_err(|e| {
            debug!("transport rejected publish on {}: {:?}", topic, Dbg(&e));
            Error::PublishFailed
        })
    }

    /// Lets the transport run its keep-alive bookkeeping.
    pub fn service(&mut self, now_ms: u64) {
        if let Err(e) = self.session.service(now_ms) {
            debug!("broker session service failed: {:?}", Dbg(&e));
        }
    }

    fn check_links(&mut self) {
        if self.state != ConnectionState::BrokerUp {
            return;
        }
        if !self.interface.is_up() {
            warn!("network lost");
            self.session.disconnect();
            self.transition(ConnectionState::NetworkConnecting);
        } else if !self.session.is_connected() {
            warn!("broker session lost");
            self.transition(ConnectionState::NetworkConnecting);
        }
    }

    fn step(&mut self) {
        match self.state {
            ConnectionState::Disconnected => self.transition(ConnectionState::NetworkConnecting),
            ConnectionState::NetworkConnecting => {
                self.attach();
                self.transition(ConnectionState::NetworkUp);
            }
            ConnectionState::NetworkUp => self.transition(ConnectionState::BrokerConnecting),
            ConnectionState::BrokerConnecting => self.handshake(),
            ConnectionState::BrokerUp => {}
        }
    }

    fn attach(&mut self) {
        if self.interface.is_up() {
            return;
        }

        info!("joining network {}", self.wifi.ssid);
        while let Err(e) = self.interface.begin(&self.wifi) {
            warn!("network join failed: {:?}", Dbg(&e));
            self.delay.delay_ms(self.retry.network_poll_delay_ms);
        }
        while !self.interface.is_up() {
            debug!("waiting for network");
            self.delay.delay_ms(self.retry.network_poll_delay_ms);
        }

        match self.interface.local_address() {
            Some(address) => info!("network up, address {:?}", Dbg(&address)),
            None => info!("network up"),
        }
    }

    fn handshake(&mut self) {
        if !self.interface.is_up() {
            warn!("network lost while connecting to broker");
            self.transition(ConnectionState::NetworkConnecting);
            return;
        }

        info!("connecting to broker as {}", self.client_id.as_str());
        match self.session.connect(&self.client_id) {
            Ok(()) => {
                info!("broker connected");
                self.transition(ConnectionState::BrokerUp);
            }
            Err(e) => {
                warn!(
                    "broker connection failed: {:?}, retrying in {} ms",
                    Dbg(&e),
                    self.retry.broker_retry_delay_ms
                );
                self.delay.delay_ms(self.retry.broker_retry_delay_ms);
            }
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        debug!("connectivity {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

impl<I, S, D> core::fmt::Debug for ConnectivityManager<'_, I, S, D>
where
    I: Interface,
    S: BrokerSession,
    D: Delay,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConnectivityManager")
            .field("state", &self.state)
            .field("client_id", &self.client_id.as_str())
            .field("retry", &self.retry)
            .finish()
    }
}
