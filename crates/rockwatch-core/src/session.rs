//! Monitoring session: a channel wired to an aggregator.
//!
//! [`MonitoringSession::open`] registers handlers on a [`ReadingChannel`] that
//! translate inbound readings into [`StreamingAggregator::ingest`] calls and
//! lifecycle signals into connection-state transitions. Presentation layers
//! read owned [`DashboardSnapshot`]s and may [`subscribe`](MonitoringSession::subscribe)
//! to a broadcast of [`SessionEvent`]s.
//!
//! The session starts in [`ConnectionState::Connecting`] with empty windows.
//! Closing it (explicitly or by dropping it) unsubscribes from the channel
//! exactly once and discards both windows.
//!
//! ```
//! use rockwatch_core::{ManualChannel, MonitoringSession, SessionOptions};
//! use rockwatch_types::{ConnectionState, RiskLevel, TransportSignal};
//!
//! let channel = ManualChannel::new();
//! let feed = channel.handle();
//! let session = MonitoringSession::open(channel, SessionOptions::default()).unwrap();
//!
//! feed.signal(TransportSignal::Connect).unwrap();
//! feed.send_json(r#"{"co2": 1050, "temperature": 42, "humidity": 96}"#).unwrap();
//!
//! let snapshot = session.snapshot();
//! assert_eq!(snapshot.state, ConnectionState::Connected);
//! assert_eq!(snapshot.assessment.map(|a| a.level), Some(RiskLevel::Critical));
//! assert!(session.close());
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use rockwatch_types::{ConnectionState, RawReading, Reading, RiskAssessment, TransportSignal};

use crate::aggregator::{AggregatorOptions, StreamingAggregator};
use crate::channel::{ReadingChannel, lock};
use crate::error::{Error, Result};
use crate::history::{HistoryEntry, HistoryStats, PredictionEntry, RiskDistribution};
use crate::validation::{ReadingValidator, ValidationWarning, ValidatorConfig};

/// Options for a [`MonitoringSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Window capacities and classifier thresholds.
    pub aggregator: AggregatorOptions,
    /// Plausibility checks applied to inbound readings.
    pub validator: ValidatorConfig,
    /// Capacity of the session event broadcast.
    /// Default: 64 events.
    pub event_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            aggregator: AggregatorOptions::default(),
            validator: ValidatorConfig::default(),
            event_capacity: 64,
        }
    }
}

impl SessionOptions {
    /// Create options with the given aggregator options.
    pub fn with_aggregator(aggregator: AggregatorOptions) -> Self {
        Self {
            aggregator,
            ..Default::default()
        }
    }

    /// Set the validator configuration.
    #[must_use]
    pub fn validator(mut self, config: ValidatorConfig) -> Self {
        self.validator = config;
        self
    }

    /// Set the event broadcast capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Validate the options and return an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(Error::invalid_config("event_capacity must be > 0"));
        }
        self.aggregator.validate()
    }
}

/// Events published to session subscribers.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SessionEvent {
    /// A reading was ingested and scored.
    Assessed {
        reading: Reading,
        assessment: RiskAssessment,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<ValidationWarning>,
    },
    /// The connection state changed.
    StateChanged { state: ConnectionState },
}

/// Owned, consistent view of a session for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Connection state.
    pub state: ConnectionState,
    /// Most recent reading.
    pub latest: Option<Reading>,
    /// Assessment of the most recent reading.
    pub assessment: Option<RiskAssessment>,
    /// Environmental history, oldest first.
    pub history: Vec<HistoryEntry>,
    /// Prediction history, oldest first.
    pub predictions: Vec<PredictionEntry>,
    /// Levels across the prediction window.
    pub distribution: RiskDistribution,
    /// Statistics over the environmental history.
    pub stats: HistoryStats,
    /// Readings ingested since the session opened.
    pub ingested: u64,
}

impl DashboardSnapshot {
    fn capture(aggregator: &StreamingAggregator) -> Self {
        let history = aggregator.history();
        Self {
            state: aggregator.connection_state(),
            latest: aggregator.latest().cloned(),
            assessment: aggregator.latest_assessment().cloned(),
            stats: HistoryStats::from_entries(&history),
            history,
            predictions: aggregator.predictions(),
            distribution: aggregator.distribution(),
            ingested: aggregator.ingested_count(),
        }
    }
}

/// State shared between the session and the channel handlers.
struct Shared {
    aggregator: Mutex<StreamingAggregator>,
    validator: ReadingValidator,
    events: broadcast::Sender<SessionEvent>,
    closed: AtomicBool,
}

impl Shared {
    fn handle_reading(&self, raw: RawReading) {
        let mut validation = self.validator.validate_raw(&raw);
        let reading = raw.into_reading(OffsetDateTime::now_utc());
        validation.merge(self.validator.validate(&reading));

        for warning in &validation.warnings {
            warn!(%warning, "Suspicious reading");
        }

        let assessment = {
            let mut aggregator = lock(&self.aggregator);
            if self.closed.load(Ordering::Acquire) {
                debug!("Reading arrived after close, dropping");
                return;
            }
            aggregator.ingest(reading.clone())
        };

        // Ignore error if no receivers
        let _ = self.events.send(SessionEvent::Assessed {
            reading,
            assessment,
            warnings: validation.warnings,
        });
    }

    fn handle_signal(&self, signal: TransportSignal) {
        let (previous, state) = {
            let mut aggregator = lock(&self.aggregator);
            if self.closed.load(Ordering::Acquire) {
                return;
            }
            let previous = aggregator.connection_state();
            (previous, aggregator.apply_signal(signal))
        };

        if previous != state {
            let _ = self.events.send(SessionEvent::StateChanged { state });
        }
    }
}

/// A live monitoring session over one channel.
pub struct MonitoringSession {
    channel: Box<dyn ReadingChannel>,
    shared: Arc<Shared>,
}

impl MonitoringSession {
    /// Open a session on a channel.
    ///
    /// Registers the reading and state handlers, then starts the channel.
    pub fn open<C>(channel: C, options: SessionOptions) -> Result<Self>
    where
        C: ReadingChannel + 'static,
    {
        options.validate()?;
        let aggregator = StreamingAggregator::new(options.aggregator)?;
        let (events, _) = broadcast::channel(options.event_capacity);

        let shared = Arc::new(Shared {
            aggregator: Mutex::new(aggregator),
            validator: ReadingValidator::new(options.validator),
            events,
            closed: AtomicBool::new(false),
        });

        let on_reading = Arc::clone(&shared);
        channel.on_reading(Arc::new(move |raw| on_reading.handle_reading(raw)));
        let on_signal = Arc::clone(&shared);
        channel.on_state_change(Arc::new(move |signal| on_signal.handle_signal(signal)));

        let session = Self {
            channel: Box::new(channel),
            shared,
        };
        session.channel.start()?;

        info!("Monitoring session opened");
        Ok(session)
    }

    /// Take a consistent snapshot of the dashboard state.
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot::capture(&lock(&self.shared.aggregator))
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        lock(&self.shared.aggregator).connection_state()
    }

    /// Assessment of the most recent reading.
    pub fn latest_assessment(&self) -> Option<RiskAssessment> {
        lock(&self.shared.aggregator).latest_assessment().cloned()
    }

    /// Close the session.
    ///
    /// Unsubscribes from the channel and discards both windows. Returns `true`
    /// only for the call that actually closed the session.
    pub fn close(&self) -> bool {
        {
            let mut aggregator = lock(&self.shared.aggregator);
            if self.shared.closed.swap(true, Ordering::AcqRel) {
                return false;
            }
            aggregator.reset();
        }
        self.channel.close();
        info!("Monitoring session closed");
        true
    }

    /// Check if the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}

impl Drop for MonitoringSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for MonitoringSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitoringSession")
            .field("state", &self.connection_state())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
