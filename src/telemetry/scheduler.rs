//! The node's control loop.

use super::publisher;
use crate::config::{DeviceId, SAMPLE_INTERVAL_MS};
use crate::connectivity::{BrokerSession, ConnectivityManager};
use crate::fmt::Dbg;
use crate::network::Interface;
use crate::sensor::{self, AnalogInput, Thermistor};
use crate::time::{Clock, Delay};

/// Cadence gate of the sampling cycle.
///
/// `last_fire_ms` starts at 0, the clock's origin, so the first cycle runs
/// one full interval after boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleClock {
    last_fire_ms: u64,
    interval_ms: u64,
}

impl ScheduleClock {
    /// A gate firing every `interval_ms`.
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            last_fire_ms: 0,
            interval_ms,
        }
    }

    /// Whether a full interval has elapsed since the last cycle.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.wrapping_sub(self.last_fire_ms) >= self.interval_ms
    }

    /// Records a cycle at `now_ms`.
    pub fn fire(&mut self, now_ms: u64) {
        self.last_fire_ms = now_ms;
    }

    /// Time of the last cycle.
    pub fn last_fire_ms(&self) -> u64 {
        self.last_fire_ms
    }

    /// Interval between cycles.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

impl Default for ScheduleClock {
    fn default() -> Self {
        Self::new(SAMPLE_INTERVAL_MS)
    }
}

/// What one iteration of the loop did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// The interval has not elapsed; nothing sampled.
    Idle,
    /// The sample could not be converted; nothing published.
    SensorFault(sensor::Error),
    /// The reading was published.
    Published(f32),
    /// The reading was converted but the broker session rejected it.
    PublishFailed(f32),
    /// The reading could not be formatted.
    Dropped(super::Error),
}

/// Ties sampling, conversion and publishing together.
///
/// Each [`tick`](Self::tick):
///
/// 1. blocks until the broker session is up,
/// 2. lets the transport run its keep-alive,
/// 3. returns early unless the sampling interval has elapsed,
/// 4. samples and converts, skipping the cycle on a sensor fault,
/// 5. publishes once; a failure drops the reading.
pub struct Scheduler<'a, A, K, I, S, D>
where
    A: AnalogInput,
    K: Clock,
    I: Interface,
    S: BrokerSession,
    D: Delay,
{
    device: DeviceId,
    thermistor: Thermistor,
    input: A,
    clock: K,
    connectivity: ConnectivityManager<'a, I, S, D>,
    schedule: ScheduleClock,
}

impl<'a, A, K, I, S, D> Scheduler<'a, A, K, I, S, D>
where
    A: AnalogInput,
    K: Clock,
    I: Interface,
    S: BrokerSession,
    D: Delay,
{
    /// Creates a scheduler with the default sampling interval.
    pub fn new(
        device: DeviceId,
        thermistor: Thermistor,
        input: A,
        clock: K,
        connectivity: ConnectivityManager<'a, I, S, D>,
    ) -> Self {
        Self {
            device,
            thermistor,
            input,
            clock,
            connectivity,
            schedule: ScheduleClock::default(),
        }
    }

    /// Replaces the cadence gate.
    pub fn with_schedule(mut self, schedule: ScheduleClock) -> Self {
        self.schedule = schedule;
        self
    }

    /// The cadence gate.
    pub fn schedule(&self) -> &ScheduleClock {
        &self.schedule
    }

    /// The connectivity manager.
    pub fn connectivity(&self) -> &ConnectivityManager<'a, I, S, D> {
        &self.connectivity
    }

    /// The connectivity manager, mutably.
    pub fn connectivity_mut(&mut self) -> &mut ConnectivityManager<'a, I, S, D> {
        &mut self.connectivity
    }

    /// The analog input, mutably.
    pub fn input_mut(&mut self) -> &mut A {
        &mut self.input
    }

    /// Runs the loop forever.
    pub fn run(&mut self) -> ! {
        info!("telemetry loop started for device {}", self.device);
        loop {
            self.tick();
        }
    }

    /// Runs one iteration of the loop.
    pub fn tick(&mut self) -> Tick {
        self.connectivity.ensure_ready();

        let now = self.clock.now_ms();
        self.connectivity.service(now);

        if !self.schedule.is_due(now) {
            return Tick::Idle;
        }
        self.schedule.fire(now);

        let temperature = match self.sample() {
            Ok(temperature) => temperature,
            Err(e) => {
                warn!("sensor read error: {:?}", e);
                return Tick::SensorFault(e);
            }
        };

        let message = match publisher::format(self.device, temperature) {
            Ok(message) => message,
            Err(e) => {
                warn!("reading dropped: {:?}", e);
                return Tick::Dropped(e);
            }
        };

        match self
            .connectivity
            .publish(message.topic(), message.payload().as_bytes())
        {
            Ok(()) => {
                info!("published to {}: {}", message.topic(), message.payload());
                Tick::Published(temperature)
            }
            Err(e) => {
                warn!("publish failed: {:?}", e);
                Tick::PublishFailed(temperature)
            }
        }
    }

    fn sample(&mut self) -> Result<f32, sensor::Error> {
        let raw = self.input.read().map_err(|e| {
            debug!("analog read failed: {:?}", Dbg(&e));
            sensor::Error::ReadError
        })?;

        let sample = self.thermistor.measure(raw);
        trace!(
            "raw {} -> {} V, {} ohm",
            sample.raw_code, sample.voltage, sample.resistance_ohms
        );
        sample.temperature_c
    }
}

impl<A, K, I, S, D> core::fmt::Debug for Scheduler<'_, A, K, I, S, D>
where
    A: AnalogInput,
    K: Clock,
    I: Interface,
    S: BrokerSession,
    D: Delay,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("device", &self.device)
            .field("schedule", &self.schedule)
            .field("connectivity", &self.connectivity)
            .finish()
    }
}
