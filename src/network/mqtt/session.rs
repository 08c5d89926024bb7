//! [`BrokerSession`] over the MQTT client.

use core::fmt::Write as _;

use heapless::String;

use super::client::{Client, Incoming, Options};
use crate::config::BrokerConfig;
use crate::connectivity::BrokerSession;
use crate::network::Connect;
use crate::network::error::Error;

/// Capacity of a rendered `host:port` address.
const ADDRESS_CAPACITY: usize = 96;

/// Upper bound on packets drained per [`service`](BrokerSession::service) call.
const MAX_PACKETS_PER_SERVICE: usize = 8;

/// A broker session that opens a fresh connection for every handshake.
///
/// Keep-alive follows the usual client rule: when nothing has been sent or
/// received for a full keep-alive interval, send PINGREQ; if the next
/// interval passes without a PINGRESP, the session is dead.
///
/// # Examples
///
/// ```rust,no_run
/// # use thermonode::network::Connect;
/// use thermonode::config::BrokerConfig;
/// use thermonode::connectivity::BrokerSession;
/// use thermonode::network::mqtt::MqttSession;
///
/// # fn demo<N: Connect>(connector: N) {
/// let broker = BrokerConfig::new("192.168.1.104").with_credentials("admin", "admin1234");
/// let mut session = MqttSession::new(connector, broker);
///
/// if session.connect("sensor-client-42").is_ok() {
///     let _ = session.publish("sensor/42/data", b"{\"metric\":\"temperature\",\"value\":23.45}");
/// }
/// # }
/// ```
pub struct MqttSession<'a, N: Connect> {
    connector: N,
    broker: BrokerConfig<'a>,
    client: Option<Client<N::Connection>>,
    last_out_ms: u64,
    last_in_ms: u64,
    sent_since_service: bool,
    fresh: bool,
    ping_outstanding: bool,
}

impl<'a, N: Connect> MqttSession<'a, N> {
    /// Creates a session for `broker`; nothing is opened until
    /// [`connect`](BrokerSession::connect).
    pub fn new(connector: N, broker: BrokerConfig<'a>) -> Self {
        Self {
            connector,
            broker,
            client: None,
            last_out_ms: 0,
            last_in_ms: 0,
            sent_since_service: false,
            fresh: false,
            ping_outstanding: false,
        }
    }

    /// The broker this session talks to.
    pub fn broker(&self) -> &BrokerConfig<'a> {
        &self.broker
    }

    /// The connector used to reach the broker.
    pub fn connector(&self) -> &N {
        &self.connector
    }

    fn address(&self) -> Result<String<ADDRESS_CAPACITY>, Error> {
        let mut address = String::new();
        write!(address, "{}:{}", self.broker.host, self.broker.port)
            .map_err(|_| Error::InvalidAddress)?;
        Ok(address)
    }

    fn drop_client(&mut self) {
        if let Some(client) = self.client.take() {
            // Best effort: the connection is going away regardless.
            let _ = client.disconnect();
        }
        self.ping_outstanding = false;
    }

    fn client_mut(&mut self) -> Result<&mut Client<N::Connection>, Error> {
        match self.client.as_mut() {
            Some(client) if client.is_connected() => Ok(client),
            _ => Err(Error::NotOpen),
        }
    }
}

impl<N: Connect> BrokerSession for MqttSession<'_, N> {
    type Error = Error;

    fn connect(&mut self, client_id: &str) -> Result<(), Self::Error> {
        self.drop_client();

        let address = self.address()?;
        let connection = self
            .connector
            .connect(&address)
            .map_err(|_| Error::Unreachable)?;

        let options = Options {
            client_id,
            username: self.broker.username,
            password: self.broker.password,
            keep_alive_seconds: self.broker.keep_alive_seconds,
            clean_session: true,
        };
        self.client = Some(Client::connect(connection, options)?);
        self.fresh = true;
        self.sent_since_service = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(Client::is_connected)
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
        self.client_mut()?.publish(topic, payload)?;
        self.sent_since_service = true;
        Ok(())
    }

    fn service(&mut self, now_ms: u64) -> Result<(), Self::Error> {
        if self.fresh {
            self.last_out_ms = now_ms;
            self.last_in_ms = now_ms;
            self.fresh = false;
        }
        if self.sent_since_service {
            self.last_out_ms = now_ms;
            self.sent_since_service = false;
        }

        for _ in 0..MAX_PACKETS_PER_SERVICE {
            match self.client_mut()?.poll()? {
                Some(Incoming::PingResp) => {
                    self.ping_outstanding = false;
                    self.last_in_ms = now_ms;
                }
                Some(Incoming::Other(_)) => self.last_in_ms = now_ms,
                None => break,
            }
        }

        let keep_alive_ms = u64::from(self.broker.keep_alive_seconds) * 1000;
        if keep_alive_ms == 0 {
            return Ok(());
        }

        let idle_out = now_ms.saturating_sub(self.last_out_ms);
        let idle_in = now_ms.saturating_sub(self.last_in_ms);
        if idle_out >= keep_alive_ms || idle_in >= keep_alive_ms {
            if self.ping_outstanding {
                self.drop_client();
                return Err(Error::Timeout);
            }
            self.client_mut()?.ping()?;
            self.last_out_ms = now_ms;
            self.last_in_ms = now_ms;
            self.ping_outstanding = true;
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.drop_client();
    }
}

impl<N: Connect> core::fmt::Debug for MqttSession<'_, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MqttSession")
            .field("broker", &self.broker)
            .field("client", &self.client)
            .field("ping_outstanding", &self.ping_outstanding)
            .finish()
    }
}
