//! Streaming aggregation of live readings.
//!
//! The [`StreamingAggregator`] owns two bounded windows: the environmental
//! history (readings annotated with their score, default 20 records) and the
//! prediction history (score/level summaries, default 10 records). Each call
//! to [`StreamingAggregator::ingest`] scores the reading and appends one record
//! to each window, evicting the oldest record of a full window.
//!
//! Connection state is tracked alongside but is only ever changed by
//! transport signals, never by reading traffic. An error signal leaves both
//! windows untouched, and ingestion resumes unchanged after a reconnect.
//!
//! ```
//! use rockwatch_core::StreamingAggregator;
//! use rockwatch_types::{Reading, RiskLevel};
//!
//! let mut aggregator = StreamingAggregator::default();
//! for i in 0..25 {
//!     aggregator.ingest(Reading::builder().co2(400.0 + i as f64).temperature(20.0).humidity(50.0).build());
//! }
//! assert_eq!(aggregator.history().len(), 20);
//! assert_eq!(aggregator.predictions().len(), 10);
//! assert_eq!(aggregator.latest_assessment().map(|a| a.level), Some(RiskLevel::Low));
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rockwatch_types::{ConnectionState, Reading, RiskAssessment, TransportSignal};

use crate::classifier::{ClassifierConfig, RiskClassifier};
use crate::error::{Error, Result};
use crate::history::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_PREDICTION_CAPACITY, HistoryEntry, HistoryStats,
    HistoryWindow, PredictionEntry, RiskDistribution,
};

/// Options for a [`StreamingAggregator`].
///
/// Use the builder pattern for convenient configuration:
///
/// ```
/// use rockwatch_core::AggregatorOptions;
///
/// let options = AggregatorOptions::builder()
///     .history_capacity(50)
///     .prediction_capacity(25)
///     .build();
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorOptions {
    /// Capacity of the environmental history window.
    /// Default: 20 records.
    pub history_capacity: usize,
    /// Capacity of the prediction history window.
    /// Default: 10 records.
    pub prediction_capacity: usize,
    /// Classifier thresholds.
    pub classifier: ClassifierConfig,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            prediction_capacity: DEFAULT_PREDICTION_CAPACITY,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl AggregatorOptions {
    /// Create a new builder for AggregatorOptions.
    pub fn builder() -> AggregatorOptionsBuilder {
        AggregatorOptionsBuilder::default()
    }

    /// Validate the options and return an error if invalid.
    ///
    /// Checks that:
    /// - `history_capacity` is > 0
    /// - `prediction_capacity` is > 0
    /// - the classifier configuration is valid
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(Error::invalid_config("history_capacity must be > 0"));
        }
        if self.prediction_capacity == 0 {
            return Err(Error::invalid_config("prediction_capacity must be > 0"));
        }
        self.classifier.validate()
    }
}

/// Builder for AggregatorOptions.
#[derive(Debug, Clone, Default)]
pub struct AggregatorOptionsBuilder {
    options: AggregatorOptions,
}

impl AggregatorOptionsBuilder {
    /// Set the environmental history capacity.
    #[must_use]
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.options.history_capacity = capacity;
        self
    }

    /// Set the prediction history capacity.
    #[must_use]
    pub fn prediction_capacity(mut self, capacity: usize) -> Self {
        self.options.prediction_capacity = capacity;
        self
    }

    /// Set the classifier thresholds.
    #[must_use]
    pub fn classifier(mut self, config: ClassifierConfig) -> Self {
        self.options.classifier = config;
        self
    }

    /// Build the AggregatorOptions.
    #[must_use]
    pub fn build(self) -> AggregatorOptions {
        self.options
    }
}

/// Bounded, time-ordered aggregation of a live reading feed.
#[derive(Debug, Clone)]
pub struct StreamingAggregator {
    classifier: RiskClassifier,
    history: HistoryWindow<HistoryEntry>,
    predictions: HistoryWindow<PredictionEntry>,
    latest: Option<(Reading, RiskAssessment)>,
    state: ConnectionState,
    ingested: u64,
}

impl StreamingAggregator {
    /// Create an aggregator from validated options.
    pub fn new(options: AggregatorOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::from_parts(
            RiskClassifier::new(options.classifier)?,
            options.history_capacity,
            options.prediction_capacity,
        ))
    }

    fn from_parts(
        classifier: RiskClassifier,
        history_capacity: usize,
        prediction_capacity: usize,
    ) -> Self {
        Self {
            classifier,
            history: HistoryWindow::with_capacity(history_capacity),
            predictions: HistoryWindow::with_capacity(prediction_capacity),
            latest: None,
            state: ConnectionState::Connecting,
            ingested: 0,
        }
    }

    /// Score a reading and record it in both windows.
    ///
    /// Returns the assessment of the ingested reading.
    pub fn ingest(&mut self, reading: Reading) -> RiskAssessment {
        let assessment = self.classifier.assess(&reading);

        self.history.push(HistoryEntry::new(&reading, &assessment));
        self.predictions
            .push(PredictionEntry::new(&reading, &assessment));
        self.ingested += 1;

        debug!(
            co2 = reading.co2,
            temperature = reading.temperature,
            humidity = reading.humidity,
            score = assessment.score,
            level = %assessment.level,
            "Ingested reading"
        );

        self.latest = Some((reading, assessment.clone()));
        assessment
    }

    /// Most recently ingested reading.
    pub fn latest(&self) -> Option<&Reading> {
        self.latest.as_ref().map(|(reading, _)| reading)
    }

    /// Assessment of the most recently ingested reading.
    pub fn latest_assessment(&self) -> Option<&RiskAssessment> {
        self.latest.as_ref().map(|(_, assessment)| assessment)
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// Apply a transport lifecycle signal.
    ///
    /// Returns the new state. History is never touched.
    pub fn apply_signal(&mut self, signal: TransportSignal) -> ConnectionState {
        let previous = self.state;
        self.state = previous.apply(signal);
        if previous != self.state {
            info!(from = %previous, to = %self.state, "Connection state changed");
        }
        self.state
    }

    /// Snapshot of the environmental history, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.snapshot()
    }

    /// Snapshot of the prediction history, oldest first.
    pub fn predictions(&self) -> Vec<PredictionEntry> {
        self.predictions.snapshot()
    }

    /// Count of predictions per level in the prediction window.
    pub fn distribution(&self) -> RiskDistribution {
        RiskDistribution::from_predictions(self.predictions.iter())
    }

    /// Statistics over the environmental history window.
    pub fn stats(&self) -> HistoryStats {
        HistoryStats::from_entries(&self.history.snapshot())
    }

    /// Total number of readings ingested, including evicted ones.
    pub fn ingested_count(&self) -> u64 {
        self.ingested
    }

    /// Capacities of the (history, prediction) windows.
    pub fn capacities(&self) -> (usize, usize) {
        (self.history.capacity(), self.predictions.capacity())
    }

    /// The classifier used for scoring.
    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    /// Discard both windows and the latest reading.
    ///
    /// Connection state and the ingest counter are left as they are.
    pub fn reset(&mut self) {
        self.history.clear();
        self.predictions.clear();
        self.latest = None;
    }
}

impl Default for StreamingAggregator {
    fn default() -> Self {
        Self::from_parts(
            RiskClassifier::default(),
            DEFAULT_HISTORY_CAPACITY,
            DEFAULT_PREDICTION_CAPACITY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rockwatch_types::RiskLevel;
    use time::{Duration, OffsetDateTime};

    fn reading_at(i: i64, co2: f64) -> Reading {
        Reading::builder()
            .co2(co2)
            .temperature(20.0)
            .humidity(50.0)
            .timestamp(OffsetDateTime::UNIX_EPOCH + Duration::seconds(i))
            .build()
    }

    #[test]
    fn test_options_default() {
        let opts = AggregatorOptions::default();
        assert_eq!(opts.history_capacity, 20);
        assert_eq!(opts.prediction_capacity, 10);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_options_builder_partial() {
        let opts = AggregatorOptions::builder().history_capacity(5).build();
        assert_eq!(opts.history_capacity, 5);
        assert_eq!(opts.prediction_capacity, 10); // default
    }

    #[test]
    fn test_options_reject_zero_capacity() {
        let opts = AggregatorOptions::builder().prediction_capacity(0).build();
        assert!(matches!(opts.validate(), Err(Error::InvalidConfig(_))));
        assert!(StreamingAggregator::new(opts).is_err());
    }

    #[test]
    fn test_empty_aggregator() {
        let agg = StreamingAggregator::default();
        assert!(agg.latest().is_none());
        assert!(agg.latest_assessment().is_none());
        assert!(agg.history().is_empty());
        assert!(agg.predictions().is_empty());
        assert_eq!(agg.connection_state(), ConnectionState::Connecting);
        assert_eq!(agg.capacities(), (20, 10));
    }

    #[test]
    fn test_ingest_twenty_five_keeps_newest_twenty() {
        let mut agg = StreamingAggregator::default();
        for i in 0..25 {
            agg.ingest(reading_at(i, 400.0 + i as f64));
        }

        let history = agg.history();
        assert_eq!(history.len(), 20);
        let co2: Vec<f64> = history.iter().map(|e| e.co2).collect();
        let expected: Vec<f64> = (5..25).map(|i| 400.0 + i as f64).collect();
        assert_eq!(co2, expected);
        assert_eq!(agg.ingested_count(), 25);
    }

    #[test]
    fn test_ingest_fifteen_keeps_ten_predictions() {
        let mut agg = StreamingAggregator::default();
        for i in 0..15 {
            agg.ingest(reading_at(i, 400.0));
        }
        let predictions = agg.predictions();
        assert_eq!(predictions.len(), 10);
        assert_eq!(
            predictions.first().map(|p| p.time),
            Some(OffsetDateTime::UNIX_EPOCH + Duration::seconds(5))
        );
    }

    #[test]
    fn test_latest_tracks_last_ingest() {
        let mut agg = StreamingAggregator::default();
        agg.ingest(reading_at(0, 400.0));
        let assessment = agg.ingest(reading_at(1, 1050.0));

        assert_eq!(agg.latest().map(|r| r.co2), Some(1050.0));
        assert_eq!(agg.latest_assessment(), Some(&assessment));
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(agg.history().last().map(|e| e.risk_score), Some(4));
    }

    #[test]
    fn test_duplicate_timestamps_are_distinct_records() {
        let mut agg = StreamingAggregator::default();
        agg.ingest(reading_at(0, 400.0));
        agg.ingest(reading_at(0, 400.0));
        assert_eq!(agg.history().len(), 2);
        assert_eq!(agg.predictions().len(), 2);
    }

    #[test]
    fn test_error_keeps_history() {
        let mut agg = StreamingAggregator::default();
        agg.apply_signal(TransportSignal::Connect);
        agg.ingest(reading_at(0, 400.0));
        agg.ingest(reading_at(1, 700.0));

        assert_eq!(
            agg.apply_signal(TransportSignal::ConnectError),
            ConnectionState::Error
        );
        assert_eq!(agg.history().len(), 2);

        assert_eq!(
            agg.apply_signal(TransportSignal::Connect),
            ConnectionState::Connected
        );
        agg.ingest(reading_at(2, 900.0));
        assert_eq!(agg.history().len(), 3);
    }

    #[test]
    fn test_state_not_inferred_from_readings() {
        let mut agg = StreamingAggregator::default();
        agg.ingest(reading_at(0, 400.0));
        assert_eq!(agg.connection_state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_distribution_and_stats() {
        let mut agg = StreamingAggregator::default();
        agg.ingest(reading_at(0, 400.0)); // low
        agg.ingest(reading_at(1, 650.0)); // medium
        agg.ingest(reading_at(2, 1100.0)); // high

        let dist = agg.distribution();
        assert_eq!((dist.low, dist.medium, dist.high, dist.critical), (1, 1, 1, 0));

        let stats = agg.stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.peak_score, Some(4));
        assert_eq!(stats.co2.map(|s| s.max), Some(1100.0));
    }

    #[test]
    fn test_custom_capacities() {
        let opts = AggregatorOptions::builder()
            .history_capacity(3)
            .prediction_capacity(2)
            .build();
        let mut agg = StreamingAggregator::new(opts).unwrap();
        for i in 0..5 {
            agg.ingest(reading_at(i, 400.0));
        }
        assert_eq!(agg.history().len(), 3);
        assert_eq!(agg.predictions().len(), 2);
    }

    #[test]
    fn test_reset_discards_windows() {
        let mut agg = StreamingAggregator::default();
        agg.apply_signal(TransportSignal::Connect);
        agg.ingest(reading_at(0, 400.0));
        agg.reset();
        assert!(agg.history().is_empty());
        assert!(agg.latest().is_none());
        assert_eq!(agg.connection_state(), ConnectionState::Connected);
    }
}
