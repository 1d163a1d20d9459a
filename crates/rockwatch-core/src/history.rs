//! Bounded recent-history windows.
//!
//! A [`HistoryWindow`] keeps at most `capacity` records in arrival order and
//! evicts the oldest record when a push would exceed the bound. Readers get
//! owned snapshots, never a view into the live buffer.
//!
//! The record types stored by the aggregator live here as well:
//! [`HistoryEntry`] (a reading annotated with its score, one row of the trend
//! chart) and [`PredictionEntry`] (a score/level summary), together with the
//! derived [`RiskDistribution`] and [`HistoryStats`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use rockwatch_types::{Reading, RiskAssessment, RiskLevel};

/// Default capacity of the raw reading history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Default capacity of the prediction history.
pub const DEFAULT_PREDICTION_CAPACITY: usize = 10;

/// Fixed-capacity FIFO buffer of recent records, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryWindow<T> {
    records: VecDeque<T>,
    capacity: usize,
}

impl<T> HistoryWindow<T> {
    /// Create an empty window holding at most `capacity` records.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, returning the evicted oldest record if the window was full.
    pub fn push(&mut self, record: T) -> Option<T> {
        let evicted = if self.records.len() >= self.capacity {
            self.records.pop_front()
        } else {
            None
        };
        self.records.push_back(record);
        evicted
    }

    /// Append many records, then trim so that only the newest `capacity` remain.
    ///
    /// Returns the number of records evicted.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, records: I) -> usize {
        self.records.extend(records);
        let excess = self.records.len().saturating_sub(self.capacity);
        self.records.drain(..excess);
        excess
    }

    /// Maximum number of records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the window holds `capacity` records.
    pub fn is_full(&self) -> bool {
        self.records.len() == self.capacity
    }

    /// Most recently pushed record.
    pub fn latest(&self) -> Option<&T> {
        self.records.back()
    }

    /// Oldest record still held.
    pub fn oldest(&self) -> Option<&T> {
        self.records.front()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.records.iter()
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<T: Clone> HistoryWindow<T> {
    /// Owned copy of the records, oldest to newest.
    pub fn snapshot(&self) -> Vec<T> {
        self.records.iter().cloned().collect()
    }

    /// Owned copy of the records, newest first (table order).
    pub fn snapshot_newest_first(&self) -> Vec<T> {
        self.records.iter().rev().cloned().collect()
    }
}

/// One row of the environmental history: a reading annotated with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Capture time of the reading.
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    /// CO2 concentration in ppm.
    pub co2: f64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Temperature in degrees Fahrenheit.
    pub temperature_f: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Risk score of the reading.
    pub risk_score: u8,
}

impl HistoryEntry {
    /// Build an entry from a reading and its assessment.
    pub fn new(reading: &Reading, assessment: &RiskAssessment) -> Self {
        Self {
            time: reading.timestamp,
            co2: reading.co2,
            temperature: reading.temperature,
            temperature_f: reading.temperature_f,
            humidity: reading.humidity,
            risk_score: assessment.score,
        }
    }
}

/// Score and level of one assessed reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionEntry {
    /// Capture time of the reading.
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    /// Risk score.
    pub score: u8,
    /// Risk level.
    pub level: RiskLevel,
}

impl PredictionEntry {
    /// Build an entry from a reading and its assessment.
    pub fn new(reading: &Reading, assessment: &RiskAssessment) -> Self {
        Self {
            time: reading.timestamp,
            score: assessment.score,
            level: assessment.level,
        }
    }
}

/// Number of predictions per risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    /// Predictions at [`RiskLevel::Low`].
    pub low: usize,
    /// Predictions at [`RiskLevel::Medium`].
    pub medium: usize,
    /// Predictions at [`RiskLevel::High`].
    pub high: usize,
    /// Predictions at [`RiskLevel::Critical`].
    pub critical: usize,
}

impl RiskDistribution {
    /// Count predictions by level.
    pub fn from_predictions<'a, I>(predictions: I) -> Self
    where
        I: IntoIterator<Item = &'a PredictionEntry>,
    {
        let mut dist = Self::default();
        for p in predictions {
            match p.level {
                RiskLevel::Low => dist.low += 1,
                RiskLevel::Medium => dist.medium += 1,
                RiskLevel::High => dist.high += 1,
                RiskLevel::Critical => dist.critical += 1,
            }
        }
        dist
    }

    /// Count at a given level.
    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
            RiskLevel::Critical => self.critical,
        }
    }

    /// Total number of predictions counted.
    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.critical
    }

    /// Most frequent level; ties go to the more severe level.
    pub fn dominant(&self) -> Option<RiskLevel> {
        if self.total() == 0 {
            return None;
        }
        RiskLevel::ALL
            .into_iter()
            .max_by_key(|level| self.count(*level))
    }
}

/// Min / max / mean of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
}

impl MetricStats {
    fn from_values(values: impl Iterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.filter(|v| v.is_finite()) {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        (count > 0).then(|| Self {
            min,
            max,
            mean: sum / count as f64,
        })
    }
}

/// Summary of the environmental history window.
///
/// Non-finite values are skipped; a metric with no finite values is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Number of entries summarized.
    pub count: usize,
    /// CO2 statistics (ppm).
    pub co2: Option<MetricStats>,
    /// Temperature statistics (°C).
    pub temperature: Option<MetricStats>,
    /// Humidity statistics (%).
    pub humidity: Option<MetricStats>,
    /// Highest risk score in the window.
    pub peak_score: Option<u8>,
}

impl HistoryStats {
    /// Compute statistics over history entries.
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        Self {
            count: entries.len(),
            co2: MetricStats::from_values(entries.iter().map(|e| e.co2)),
            temperature: MetricStats::from_values(entries.iter().map(|e| e.temperature)),
            humidity: MetricStats::from_values(entries.iter().map(|e| e.humidity)),
            peak_score: entries.iter().map(|e| e.risk_score).max(),
        }
    }
}
