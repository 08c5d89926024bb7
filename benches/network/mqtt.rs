use criterion::{BatchSize, Criterion, Throughput};
use thermonode::config::BrokerConfig;
use thermonode::connectivity::BrokerSession;
use thermonode::network::error::Error;
use thermonode::network::mqtt::{Client, MqttSession, Options};
use thermonode::network::{Close, Connect, Connection, Read, Write};

const CONNACK_ACCEPTED: [u8; 4] = [0x20, 0x02, 0x00, 0x00];

/// Connection that answers the handshake and swallows everything written.
struct SinkConnection {
    pending: &'static [u8],
}

impl SinkConnection {
    fn new() -> Self {
        Self {
            pending: &CONNACK_ACCEPTED,
        }
    }
}

impl Read for SinkConnection {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let len = buf.len().min(self.pending.len());
        buf[..len].copy_from_slice(&self.pending[..len]);
        self.pending = &self.pending[len..];
        Ok(len)
    }
}

impl Write for SinkConnection {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for SinkConnection {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for SinkConnection {}

struct SinkConnector;

impl Connect for SinkConnector {
    type Connection = SinkConnection;
    type Error = Error;
    fn connect(&mut self, _remote: &str) -> Result<Self::Connection, Self::Error> {
        Ok(SinkConnection::new())
    }
}

fn setup_client() -> Client<SinkConnection> {
    let opts = Options {
        client_id: "sensor-client-42",
        username: Some("admin"),
        password: Some("admin1234"),
        keep_alive_seconds: 15,
        clean_session: true,
    };
    Client::connect(SinkConnection::new(), opts).expect("Failed to connect")
}

pub fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish");
    let payload = b"{\"metric\":\"temperature\",\"value\":23.45}";
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("publish", |b| {
        b.iter_batched_ref(
            setup_client,
            |client| {
                client
                    .publish("sensor/42/data", payload)
                    .expect("Failed to publish");
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_service_idle(c: &mut Criterion) {
    c.bench_function("service_idle", |b| {
        b.iter_batched_ref(
            || {
                let mut session = MqttSession::new(SinkConnector, BrokerConfig::new("broker.local"));
                session.connect("sensor-client-42").expect("Failed to connect");
                session
            },
            |session| {
                for now in (0..10_000).step_by(100) {
                    session.service(now).expect("Failed to service");
                }
            },
            BatchSize::SmallInput,
        )
    });
}
