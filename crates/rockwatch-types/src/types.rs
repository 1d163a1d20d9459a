//! Core types for rockfall monitoring data.

use core::fmt;
use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// Convert a Celsius temperature to Fahrenheit.
#[must_use]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// A single sensor observation.
///
/// Readings are plain values: once built, nothing in this workspace hands out
/// mutable access to one that has been ingested.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// CO2 concentration in ppm.
    pub co2: f64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Temperature in degrees Fahrenheit (display duplicate of `temperature`).
    pub temperature_f: f64,
    /// Relative humidity percentage (0-100).
    pub humidity: f64,
    /// When the reading was captured.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
}

impl Reading {
    /// Create a reading, deriving the Fahrenheit value from `temperature`.
    #[must_use]
    pub fn new(co2: f64, temperature: f64, humidity: f64, timestamp: OffsetDateTime) -> Self {
        Self {
            co2,
            temperature,
            temperature_f: celsius_to_fahrenheit(temperature),
            humidity,
            timestamp,
        }
    }

    /// Replace the derived Fahrenheit value with one reported by the sensor.
    #[must_use]
    pub fn with_fahrenheit(mut self, temperature_f: f64) -> Self {
        self.temperature_f = temperature_f;
        self
    }

    /// Create a builder for `Reading`.
    #[must_use]
    pub fn builder() -> ReadingBuilder {
        ReadingBuilder::default()
    }
}

/// Builder for constructing [`Reading`] values.
///
/// Unset numeric fields are zero and the timestamp defaults to the Unix epoch.
#[derive(Debug, Default)]
#[must_use]
pub struct ReadingBuilder {
    co2: f64,
    temperature: f64,
    temperature_f: Option<f64>,
    humidity: f64,
    timestamp: Option<OffsetDateTime>,
}

impl ReadingBuilder {
    /// Set CO2 concentration in ppm.
    pub fn co2(mut self, co2: f64) -> Self {
        self.co2 = co2;
        self
    }

    /// Set temperature in degrees Celsius.
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set an explicit Fahrenheit temperature instead of deriving it.
    pub fn temperature_f(mut self, temperature_f: f64) -> Self {
        self.temperature_f = Some(temperature_f);
        self
    }

    /// Set relative humidity percentage.
    pub fn humidity(mut self, humidity: f64) -> Self {
        self.humidity = humidity;
        self
    }

    /// Set the capture timestamp.
    pub fn timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build the reading.
    #[must_use]
    pub fn build(self) -> Reading {
        let reading = Reading::new(
            self.co2,
            self.temperature,
            self.humidity,
            self.timestamp.unwrap_or(OffsetDateTime::UNIX_EPOCH),
        );
        match self.temperature_f {
            Some(f) => reading.with_fahrenheit(f),
            None => reading,
        }
    }
}

/// Severity tier derived from a risk score.
///
/// # Ordering
///
/// Levels are ordered by severity: `Low < Medium < High < Critical`, so a
/// higher score can be checked with plain comparisons.
///
/// ```
/// use rockwatch_types::RiskLevel;
///
/// assert!(RiskLevel::Critical > RiskLevel::High);
/// assert_eq!(RiskLevel::from_score(7), RiskLevel::Critical);
/// assert_eq!(RiskLevel::from_score(3), RiskLevel::Medium);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum RiskLevel {
    /// Conditions stable.
    Low,
    /// Monitor closely.
    Medium,
    /// Rockfall possible within hours.
    High,
    /// Immediate action required.
    Critical,
}

impl RiskLevel {
    /// All levels in ascending severity.
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Map a score to a level using the standard cut-offs (2, 4, 7).
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        if score >= 7 {
            RiskLevel::Critical
        } else if score >= 4 {
            RiskLevel::High
        } else if score >= 2 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Advisory timeframe shown alongside the level.
    #[must_use]
    pub fn timeframe(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Conditions stable",
            RiskLevel::Medium => "Monitor closely - 12-24 hours",
            RiskLevel::High => "Rockfall possible within 2-6 hours",
            RiskLevel::Critical => "Immediate action required",
        }
    }

    /// Upper-case label ("LOW", "MEDIUM", ...).
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// Foreground colour used by dashboards, as a hex string.
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "#059669",
            RiskLevel::Medium => "#D97706",
            RiskLevel::High => "#EA580C",
            RiskLevel::Critical => "#DC2626",
        }
    }

    /// Background colour used by dashboards, as a hex string.
    #[must_use]
    pub fn background_color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "#D1FAE5",
            RiskLevel::Medium => "#FEF3C7",
            RiskLevel::High => "#FED7AA",
            RiskLevel::Critical => "#FEE2E2",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// A triggered classification rule.
///
/// Serializes as its human-readable description so that downstream consumers
/// see the same strings a dashboard would display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(into = "&'static str", try_from = "String")
)]
pub enum RiskFactor {
    /// CO2 above the high threshold (default 1000 ppm).
    HighCo2,
    /// CO2 above the elevated threshold (default 800 ppm).
    ElevatedCo2,
    /// CO2 above the moderate threshold (default 600 ppm).
    ModerateCo2,
    /// Temperature outside the extreme band (default below 0 or above 40 °C).
    ExtremeTemperature,
    /// Temperature outside the stress band (default below 5 or above 35 °C).
    TemperatureStress,
    /// Humidity above the critical threshold (default 95 %).
    CriticalHumidity,
    /// Humidity above the high threshold (default 85 %).
    HighHumidity,
    /// Humidity below the dry threshold (default 10 %).
    VeryDry,
}

impl RiskFactor {
    /// Every factor, in evaluation order.
    pub const ALL: [RiskFactor; 8] = [
        RiskFactor::HighCo2,
        RiskFactor::ElevatedCo2,
        RiskFactor::ModerateCo2,
        RiskFactor::ExtremeTemperature,
        RiskFactor::TemperatureStress,
        RiskFactor::CriticalHumidity,
        RiskFactor::HighHumidity,
        RiskFactor::VeryDry,
    ];

    /// Score contribution of this factor.
    #[must_use]
    pub fn weight(&self) -> u8 {
        match self {
            RiskFactor::HighCo2 => 4,
            RiskFactor::ElevatedCo2 => 3,
            RiskFactor::ModerateCo2 => 2,
            RiskFactor::ExtremeTemperature => 3,
            RiskFactor::TemperatureStress => 2,
            RiskFactor::CriticalHumidity => 3,
            RiskFactor::HighHumidity => 2,
            RiskFactor::VeryDry => 1,
        }
    }

    /// Human-readable description of the triggered rule.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            RiskFactor::HighCo2 => "High CO₂ levels detected",
            RiskFactor::ElevatedCo2 => "Elevated CO₂ levels",
            RiskFactor::ModerateCo2 => "Moderate CO₂ increase",
            RiskFactor::ExtremeTemperature => "Extreme temperature conditions",
            RiskFactor::TemperatureStress => "Temperature stress on rock structure",
            RiskFactor::CriticalHumidity => "Critical humidity - water infiltration risk",
            RiskFactor::HighHumidity => "High humidity affecting rock stability",
            RiskFactor::VeryDry => "Very dry conditions - thermal stress",
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<RiskFactor> for &'static str {
    fn from(factor: RiskFactor) -> Self {
        factor.description()
    }
}

impl TryFrom<String> for RiskFactor {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for RiskFactor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskFactor::ALL
            .into_iter()
            .find(|factor| factor.description() == s)
            .ok_or_else(|| ParseError::UnknownFactor(s.to_string()))
    }
}

/// Presentation fallback used when no factor was triggered.
pub const NORMAL_CONDITIONS: &str = "All parameters within normal range";

/// Risk derived from exactly one [`Reading`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RiskAssessment {
    /// Sum of the weights of all triggered factors.
    pub score: u8,
    /// Severity tier derived from `score`.
    pub level: RiskLevel,
    /// Triggered rules, in evaluation order (CO2, temperature, humidity).
    pub factors: Vec<RiskFactor>,
    /// Advisory timeframe tied to `level`.
    pub timeframe: Cow<'static, str>,
}

impl RiskAssessment {
    /// Build an assessment from a score, a level and the triggered factors.
    #[must_use]
    pub fn new(score: u8, level: RiskLevel, factors: Vec<RiskFactor>) -> Self {
        Self {
            score,
            level,
            factors,
            timeframe: Cow::Borrowed(level.timeframe()),
        }
    }

    /// Build an assessment by summing factor weights and applying the
    /// standard level cut-offs.
    #[must_use]
    pub fn from_factors(factors: Vec<RiskFactor>) -> Self {
        let score = factors.iter().map(RiskFactor::weight).sum();
        Self::new(score, RiskLevel::from_score(score), factors)
    }

    /// Descriptions of the triggered factors.
    #[must_use]
    pub fn factor_descriptions(&self) -> Vec<&'static str> {
        self.factors.iter().map(RiskFactor::description).collect()
    }

    /// Lines to display for this assessment, falling back to
    /// [`NORMAL_CONDITIONS`] when nothing was triggered.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<&'static str> {
        if self.factors.is_empty() {
            vec![NORMAL_CONDITIONS]
        } else {
            self.factor_descriptions()
        }
    }
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self::new(0, RiskLevel::Low, Vec::new())
    }
}

/// Lifecycle signal emitted by the external real-time transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TransportSignal {
    /// The transport established its connection.
    Connect,
    /// The transport lost or closed its connection.
    Disconnect,
    /// The transport failed to connect.
    ConnectError,
}

/// Connection state of a monitoring session.
///
/// The state is driven exclusively by [`TransportSignal`]s; it is never
/// inferred from reading traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConnectionState {
    /// Waiting for the transport to connect.
    #[default]
    Connecting,
    /// Live data is flowing.
    Connected,
    /// The transport disconnected.
    Disconnected,
    /// The transport reported a connection error.
    Error,
}

impl ConnectionState {
    /// Apply a transport signal, returning the next state.
    ///
    /// ```
    /// use rockwatch_types::{ConnectionState, TransportSignal};
    ///
    /// let state = ConnectionState::Connecting.apply(TransportSignal::Connect);
    /// assert_eq!(state, ConnectionState::Connected);
    /// assert_eq!(state.apply(TransportSignal::ConnectError), ConnectionState::Error);
    /// ```
    #[must_use]
    pub fn apply(self, signal: TransportSignal) -> Self {
        match signal {
            TransportSignal::Connect => ConnectionState::Connected,
            TransportSignal::Disconnect => ConnectionState::Disconnected,
            TransportSignal::ConnectError => ConnectionState::Error,
        }
    }

    /// Whether live data is expected.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Error => write!(f, "Connection Failed"),
        }
    }
}
