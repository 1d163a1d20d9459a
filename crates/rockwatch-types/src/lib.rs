//! Platform-agnostic types for rockfall risk monitoring.
//!
//! This crate provides the data shared by the classifier, the streaming
//! aggregator and any presentation layer built on top of them.
//!
//! # Features
//!
//! - [`Reading`]: one timestamped sensor sample (CO₂, temperature, humidity)
//! - [`RawReading`]: the loosely-typed inbound event, with zero-defaulting conversion
//! - [`RiskLevel`], [`RiskFactor`], [`RiskAssessment`]: classifier output
//! - [`ConnectionState`], [`TransportSignal`]: transport lifecycle
//!
//! # Example
//!
//! ```
//! use rockwatch_types::{RiskAssessment, RiskFactor, RiskLevel};
//!
//! let assessment = RiskAssessment::from_factors(vec![RiskFactor::ModerateCo2]);
//! assert_eq!(assessment.score, 2);
//! assert_eq!(assessment.level, RiskLevel::Medium);
//! ```

pub mod error;
pub mod raw;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use raw::{RawReading, RawTimestamp};
pub use types::{
    ConnectionState, NORMAL_CONDITIONS, Reading, ReadingBuilder, RiskAssessment, RiskFactor,
    RiskLevel, TransportSignal, celsius_to_fahrenheit,
};
