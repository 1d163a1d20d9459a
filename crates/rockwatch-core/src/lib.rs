//! Rockfall risk classification and live sensor-feed aggregation.
//!
//! This crate turns a push-based stream of environmental readings (CO₂,
//! temperature, humidity) from a rock-face sensor into a discrete rockfall
//! risk level, and keeps the bounded recent-history windows a dashboard
//! draws its charts from.
//!
//! # Features
//!
//! - **Risk classification**: weighted rule scoring into LOW / MEDIUM / HIGH / CRITICAL
//! - **Streaming aggregation**: FIFO-bounded environmental and prediction histories
//! - **Channel abstraction**: manual and stream-driven feeds behind one trait
//! - **Monitoring sessions**: consistent snapshots and broadcast events
//! - **Validation**: plausibility warnings that never drop a reading
//! - **Simulation**: seedable synthetic feeds for demos and tests
//!
//! # Risk Tiers
//!
//! | Score | Level | Timeframe |
//! |-------|-------|-----------|
//! | 0-1 | LOW | Conditions stable |
//! | 2-3 | MEDIUM | Monitor closely - 12-24 hours |
//! | 4-6 | HIGH | Rockfall possible within 2-6 hours |
//! | 7-10 | CRITICAL | Immediate action required |
//!
//! # Quick Start
//!
//! ```
//! use rockwatch_core::assess;
//! use rockwatch_types::{Reading, RiskLevel};
//!
//! let reading = Reading::builder().co2(650.0).temperature(20.0).humidity(50.0).build();
//! let assessment = assess(&reading);
//! assert_eq!(assessment.score, 2);
//! assert_eq!(assessment.level, RiskLevel::Medium);
//! assert_eq!(assessment.factor_descriptions(), vec!["Moderate CO₂ increase"]);
//! ```
//!
//! A live feed is consumed through a [`MonitoringSession`]:
//!
//! ```no_run
//! use std::time::Duration;
//! use rockwatch_core::{MonitoringSession, Scenario, SessionOptions, SimulatedSensor, StreamChannel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let feed = SimulatedSensor::new(Scenario::Escalating).into_stream(Duration::from_secs(2));
//!     let session = MonitoringSession::open(StreamChannel::new(feed), SessionOptions::default())?;
//!
//!     let mut events = session.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod channel;
pub mod classifier;
pub mod error;
pub mod history;
pub mod session;
pub mod simulate;
pub mod validation;

// Core exports
pub use aggregator::{AggregatorOptions, AggregatorOptionsBuilder, StreamingAggregator};
pub use channel::{
    ChannelEvent, ManualChannel, ManualChannelHandle, ReadingChannel, ReadingHandler,
    StateHandler, StreamChannel,
};
pub use classifier::{ClassifierConfig, RiskClassifier, assess};
pub use error::{Error, Result};
pub use history::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_PREDICTION_CAPACITY, HistoryEntry, HistoryStats,
    HistoryWindow, MetricStats, PredictionEntry, RiskDistribution,
};
pub use session::{DashboardSnapshot, MonitoringSession, SessionEvent, SessionOptions};
pub use simulate::{DEFAULT_INTERVAL, Scenario, SimulatedSensor};
pub use validation::{ReadingValidator, ValidationResult, ValidationWarning, ValidatorConfig};

// Re-export from rockwatch-types
pub use rockwatch_types::{
    ConnectionState, RawReading, Reading, RiskAssessment, RiskFactor, RiskLevel,
    TransportSignal,
};
