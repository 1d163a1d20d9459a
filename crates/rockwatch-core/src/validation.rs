//! Plausibility checks for inbound sensor readings.
//!
//! Validation never rejects a reading: the feed is always ingested, and the
//! warnings produced here are only logged and forwarded to subscribers. This
//! keeps a misbehaving sensor visible on the dashboard instead of silently
//! dropping its data.
//!
//! # Example
//!
//! ```
//! use rockwatch_core::ReadingValidator;
//! use rockwatch_types::Reading;
//!
//! let validator = ReadingValidator::default();
//!
//! let reading = Reading::builder().co2(800.0).temperature(22.5).humidity(45.0).build();
//! let result = validator.validate(&reading);
//! assert!(!result.has_warnings());
//!
//! let reading = Reading::builder().co2(-5.0).temperature(22.5).humidity(140.0).build();
//! assert_eq!(validator.validate(&reading).warnings.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use rockwatch_types::{ParseError, RawReading, Reading, celsius_to_fahrenheit};

/// Warning types for validation issues.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new warning types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ValidationWarning {
    /// A numeric field was absent from the inbound event and defaulted to 0.
    FieldMissing { field: String },
    /// The inbound timestamp could not be parsed; the receive time was used.
    TimestampUnparseable { value: String },
    /// A value is NaN or infinite.
    NonFinite { field: String },
    /// CO2 is negative.
    Co2Negative { value: f64 },
    /// CO2 is above the maximum expected value.
    Co2TooHigh { value: f64, max: f64 },
    /// Temperature is below the minimum expected value.
    TemperatureTooLow { value: f64, min: f64 },
    /// Temperature is above the maximum expected value.
    TemperatureTooHigh { value: f64, max: f64 },
    /// Humidity is outside 0-100%.
    HumidityOutOfRange { value: f64 },
    /// The Fahrenheit value does not match the Celsius value.
    FahrenheitMismatch { celsius: f64, fahrenheit: f64 },
    /// All values are zero, which usually means an empty event.
    AllZeros,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationWarning::FieldMissing { field } => {
                write!(f, "Field '{}' missing, defaulted to 0", field)
            }
            ValidationWarning::TimestampUnparseable { value } => {
                write!(f, "Timestamp '{}' unparseable, using receive time", value)
            }
            ValidationWarning::NonFinite { field } => {
                write!(f, "Field '{}' is not a finite number", field)
            }
            ValidationWarning::Co2Negative { value } => {
                write!(f, "CO2 {} ppm is negative", value)
            }
            ValidationWarning::Co2TooHigh { value, max } => {
                write!(f, "CO2 {} ppm exceeds maximum {} ppm", value, max)
            }
            ValidationWarning::TemperatureTooLow { value, min } => {
                write!(f, "Temperature {}°C is below minimum {}°C", value, min)
            }
            ValidationWarning::TemperatureTooHigh { value, max } => {
                write!(f, "Temperature {}°C exceeds maximum {}°C", value, max)
            }
            ValidationWarning::HumidityOutOfRange { value } => {
                write!(f, "Humidity {}% is out of valid range (0-100)", value)
            }
            ValidationWarning::FahrenheitMismatch {
                celsius,
                fahrenheit,
            } => {
                write!(
                    f,
                    "Fahrenheit {}°F does not match {}°C (expected {:.1}°F)",
                    fahrenheit,
                    celsius,
                    celsius_to_fahrenheit(*celsius)
                )
            }
            ValidationWarning::AllZeros => {
                write!(f, "All readings are zero - possible empty event")
            }
        }
    }
}

/// Result of validating a reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// Warnings found, in check order.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Append the warnings of another result.
    pub fn merge(&mut self, other: ValidationResult) {
        self.warnings.extend(other.warnings);
    }
}

/// Configuration for reading validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Maximum expected CO2 value (ppm).
    pub co2_max: f64,
    /// Minimum expected temperature (°C).
    pub temperature_min: f64,
    /// Maximum expected temperature (°C).
    pub temperature_max: f64,
    /// Allowed difference between the reported and derived Fahrenheit value.
    pub fahrenheit_tolerance: f64,
    /// Warn on numeric fields missing from the inbound event.
    pub warn_on_missing: bool,
    /// Warn when every value is zero.
    pub warn_on_all_zeros: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            co2_max: 10000.0,
            temperature_min: -50.0,
            temperature_max: 80.0,
            fahrenheit_tolerance: 0.5,
            warn_on_missing: true,
            warn_on_all_zeros: true,
        }
    }
}

impl ValidatorConfig {
    /// Create new validator config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum CO2 value (ppm).
    #[must_use]
    pub fn co2_max(mut self, max: f64) -> Self {
        self.co2_max = max;
        self
    }

    /// Set temperature range (min, max).
    #[must_use]
    pub fn temperature_range(mut self, min: f64, max: f64) -> Self {
        self.temperature_min = min;
        self.temperature_max = max;
        self
    }

    /// Set the Fahrenheit tolerance.
    #[must_use]
    pub fn fahrenheit_tolerance(mut self, tolerance: f64) -> Self {
        self.fahrenheit_tolerance = tolerance;
        self
    }

    /// Set whether to warn on missing fields.
    #[must_use]
    pub fn warn_on_missing(mut self, warn: bool) -> Self {
        self.warn_on_missing = warn;
        self
    }

    /// Set whether to warn on all zeros.
    #[must_use]
    pub fn warn_on_all_zeros(mut self, warn: bool) -> Self {
        self.warn_on_all_zeros = warn;
        self
    }

    /// Create validation config for underground or high-altitude sites
    /// (wide temperature range, no zero warnings).
    pub fn relaxed() -> Self {
        Self {
            co2_max: 50000.0,
            temperature_min: -70.0,
            temperature_max: 100.0,
            fahrenheit_tolerance: 2.0,
            warn_on_missing: true,
            warn_on_all_zeros: false,
        }
    }
}

/// Validator for sensor readings.
#[derive(Debug, Clone, Default)]
pub struct ReadingValidator {
    config: ValidatorConfig,
}

impl ReadingValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Check an inbound event for fields that will be defaulted.
    pub fn validate_raw(&self, raw: &RawReading) -> ValidationResult {
        let mut warnings = Vec::new();

        if self.config.warn_on_missing {
            warnings.extend(
                raw.missing_fields()
                    .into_iter()
                    .map(|field| ValidationWarning::FieldMissing {
                        field: field.to_string(),
                    }),
            );
        }

        if let Some(Err(err)) = raw.resolve_timestamp() {
            let value = match err {
                ParseError::InvalidTimestamp(value) => value,
                other => other.to_string(),
            };
            warnings.push(ValidationWarning::TimestampUnparseable { value });
        }

        ValidationResult { warnings }
    }

    /// Validate a sensor reading.
    pub fn validate(&self, reading: &Reading) -> ValidationResult {
        let mut warnings = Vec::new();

        if self.config.warn_on_all_zeros
            && reading.co2 == 0.0
            && reading.temperature == 0.0
            && reading.humidity == 0.0
        {
            warnings.push(ValidationWarning::AllZeros);
            return ValidationResult { warnings };
        }

        for (field, value) in [
            ("co2", reading.co2),
            ("temperature", reading.temperature),
            ("temperatureF", reading.temperature_f),
            ("humidity", reading.humidity),
        ] {
            if !value.is_finite() {
                warnings.push(ValidationWarning::NonFinite {
                    field: field.to_string(),
                });
            }
        }

        // Check CO2
        if reading.co2 < 0.0 {
            warnings.push(ValidationWarning::Co2Negative { value: reading.co2 });
        } else if reading.co2.is_finite() && reading.co2 > self.config.co2_max {
            warnings.push(ValidationWarning::Co2TooHigh {
                value: reading.co2,
                max: self.config.co2_max,
            });
        }

        // Check temperature
        if reading.temperature.is_finite() {
            if reading.temperature < self.config.temperature_min {
                warnings.push(ValidationWarning::TemperatureTooLow {
                    value: reading.temperature,
                    min: self.config.temperature_min,
                });
            }
            if reading.temperature > self.config.temperature_max {
                warnings.push(ValidationWarning::TemperatureTooHigh {
                    value: reading.temperature,
                    max: self.config.temperature_max,
                });
            }

            if reading.temperature_f.is_finite()
                && (celsius_to_fahrenheit(reading.temperature) - reading.temperature_f).abs()
                    > self.config.fahrenheit_tolerance
            {
                warnings.push(ValidationWarning::FahrenheitMismatch {
                    celsius: reading.temperature,
                    fahrenheit: reading.temperature_f,
                });
            }
        }

        // Check humidity
        if reading.humidity.is_finite() && !(0.0..=100.0).contains(&reading.humidity) {
            warnings.push(ValidationWarning::HumidityOutOfRange {
                value: reading.humidity,
            });
        }

        ValidationResult { warnings }
    }
}
