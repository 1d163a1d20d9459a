//! Simulated sensor feed for demos and testing.
//!
//! [`SimulatedSensor`] produces readings shaped like the live feed without any
//! hardware or network. Each [`Scenario`] exercises a different part of the
//! classifier:
//!
//! - **Stable**: readings stay inside the normal band (always LOW).
//! - **Escalating**: all three metrics drift towards critical over about
//!   thirty readings, then hold there.
//! - **Volatile**: wide random swings, with an occasional missing field.
//!
//! Seed the sensor with [`SimulatedSensor::with_seed`] for reproducible output.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::time::{Interval, MissedTickBehavior};

use rockwatch_types::{RawReading, Reading};

use crate::channel::ChannelEvent;
use crate::error::Error;

/// Push interval of the live feed.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Readings needed for the escalating scenario to reach its peak.
const ESCALATION_STEPS: f64 = 30.0;

/// Shape of the simulated feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Normal conditions.
    #[default]
    Stable,
    /// Gradual drift towards critical conditions.
    Escalating,
    /// Erratic readings.
    Volatile,
}

impl Scenario {
    /// All scenarios.
    pub const ALL: [Scenario; 3] = [Scenario::Stable, Scenario::Escalating, Scenario::Volatile];

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Stable => "stable",
            Scenario::Escalating => "escalating",
            Scenario::Volatile => "volatile",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(Scenario::Stable),
            "escalating" => Ok(Scenario::Escalating),
            "volatile" => Ok(Scenario::Volatile),
            other => Err(Error::invalid_config(format!(
                "unknown scenario '{other}' (expected stable, escalating or volatile)"
            ))),
        }
    }
}

/// A simulated rock-face sensor.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    scenario: Scenario,
    rng: StdRng,
    step: u64,
    clock: OffsetDateTime,
    spacing: Duration,
}

impl SimulatedSensor {
    /// Create a sensor seeded from the operating system.
    pub fn new(scenario: Scenario) -> Self {
        Self::from_rng(scenario, StdRng::from_os_rng())
    }

    /// Create a sensor with a fixed seed.
    pub fn with_seed(scenario: Scenario, seed: u64) -> Self {
        Self::from_rng(scenario, StdRng::seed_from_u64(seed))
    }

    fn from_rng(scenario: Scenario, rng: StdRng) -> Self {
        Self {
            scenario,
            rng,
            step: 0,
            clock: OffsetDateTime::now_utc(),
            spacing: DEFAULT_INTERVAL,
        }
    }

    /// Set the timestamp of the first reading.
    #[must_use]
    pub fn starting_at(mut self, timestamp: OffsetDateTime) -> Self {
        self.clock = timestamp;
        self
    }

    /// Set the time between reading timestamps.
    #[must_use]
    pub fn spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }

    /// The configured scenario.
    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// Number of readings generated so far.
    pub fn steps(&self) -> u64 {
        self.step
    }

    /// Generate the next reading.
    pub fn next_reading(&mut self) -> Reading {
        let (co2, temperature, humidity) = match self.scenario {
            Scenario::Stable => (
                self.rng.random_range(420.0..580.0),
                self.rng.random_range(12.0..28.0),
                self.rng.random_range(35.0..70.0),
            ),
            Scenario::Escalating => {
                let progress = (self.step as f64 / ESCALATION_STEPS).min(1.0);
                (
                    450.0 + progress * 800.0 + self.rng.random_range(-15.0..15.0),
                    20.0 + progress * 23.0 + self.rng.random_range(-0.5..0.5),
                    (50.0 + progress * 48.0 + self.rng.random_range(-1.0..1.0)).min(100.0),
                )
            }
            Scenario::Volatile => (
                self.rng.random_range(300.0..1400.0),
                self.rng.random_range(-5.0..45.0),
                self.rng.random_range(5.0..100.0),
            ),
        };

        let reading = Reading::new(round1(co2), round1(temperature), round1(humidity), self.clock);
        self.step += 1;
        self.clock += self.spacing;
        reading
    }

    /// Generate the next inbound event body, as the live feed would send it.
    ///
    /// The volatile scenario occasionally drops the humidity field.
    pub fn next_raw(&mut self) -> RawReading {
        let reading = self.next_reading();
        let mut raw = RawReading::from(&reading);
        if self.scenario == Scenario::Volatile && self.rng.random_bool(0.05) {
            raw.humidity = None;
        }
        raw
    }

    /// Turn the sensor into a live feed.
    ///
    /// Yields a connect event, then one reading per `interval`, starting
    /// immediately. Timestamps follow the wall clock.
    pub fn into_stream(self, interval: Duration) -> BoxStream<'static, ChannelEvent> {
        let period = interval.max(Duration::from_millis(1));
        let sensor = self.starting_at(OffsetDateTime::now_utc()).spacing(period);

        let readings = stream::unfold(
            (sensor, None::<Interval>),
            move |(mut sensor, ticker)| async move {
                let mut ticker = ticker.unwrap_or_else(|| {
                    let mut ticker = tokio::time::interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    ticker
                });
                ticker.tick().await;
                let event = ChannelEvent::reading(sensor.next_raw());
                Some((event, (sensor, Some(ticker))))
            },
        );

        stream::once(async { ChannelEvent::Connect })
            .chain(readings)
            .boxed()
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
