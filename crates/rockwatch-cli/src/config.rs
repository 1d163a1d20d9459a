//! CLI configuration.
//!
//! Settings are read from `config.toml` in the platform config directory
//! (`~/.config/rockwatch/config.toml` on Linux). Every section is optional;
//! a missing file or a missing key falls back to the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rockwatch_core::{
    AggregatorOptions, ClassifierConfig, DEFAULT_HISTORY_CAPACITY, DEFAULT_INTERVAL,
    DEFAULT_PREDICTION_CAPACITY, Scenario, SessionOptions, ValidatorConfig,
};
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classifier thresholds.
    pub classifier: ClassifierConfig,
    /// History window sizes.
    pub history: HistoryConfig,
    /// Plausibility checks applied to each reading.
    pub validation: ValidatorConfig,
    /// Simulated feed defaults.
    pub simulate: SimulateConfig,
    /// Output preferences.
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path, or the default path when none is given.
    ///
    /// Unlike [`load_default`](Self::load_default), an explicit path must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        // Create parent directories if needed
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Classifier thresholds are finite and ordered
    /// - History capacities are at least 1
    /// - The validation temperature range is not inverted
    /// - The simulated feed interval is not zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.classifier.validate() {
            errors.push(ValidationError {
                field: "classifier".to_string(),
                message: match e {
                    rockwatch_core::Error::InvalidConfig(message) => message,
                    other => other.to_string(),
                },
            });
        }
        errors.extend(self.history.validate());

        if self.validation.temperature_min >= self.validation.temperature_max {
            errors.push(ValidationError {
                field: "validation.temperature_min".to_string(),
                message: format!(
                    "must be below validation.temperature_max ({})",
                    self.validation.temperature_max
                ),
            });
        }

        errors.extend(self.simulate.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Session options built from the classifier, history and validation sections.
    pub fn session_options(&self) -> SessionOptions {
        let aggregator = AggregatorOptions::builder()
            .history_capacity(self.history.capacity)
            .prediction_capacity(self.history.prediction_capacity)
            .classifier(self.classifier.clone())
            .build();
        SessionOptions::with_aggregator(aggregator).validator(self.validation.clone())
    }
}

/// History window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Number of environmental readings to keep.
    pub capacity: usize,
    /// Number of risk predictions to keep.
    pub prediction_capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            prediction_capacity: DEFAULT_PREDICTION_CAPACITY,
        }
    }
}

impl HistoryConfig {
    /// Validate history settings.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.capacity == 0 {
            errors.push(ValidationError {
                field: "history.capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.prediction_capacity == 0 {
            errors.push(ValidationError {
                field: "history.prediction_capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        errors
    }
}

/// Simulated feed settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulateConfig {
    /// Feed scenario.
    pub scenario: Scenario,
    /// Milliseconds between readings.
    pub interval_ms: u64,
    /// Readings to generate before stopping (0 runs until interrupted).
    pub count: u64,
    /// Fixed seed for reproducible runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulateConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::default(),
            interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
            count: 0,
            seed: None,
        }
    }
}

impl SimulateConfig {
    /// Validate simulated feed settings.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.interval_ms == 0 {
            errors.push(ValidationError {
                field: "simulate.interval_ms".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        errors
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Output preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show temperatures in Fahrenheit.
    pub fahrenheit: bool,
    /// Disable colored output.
    pub no_color: bool,
    /// Print compact JSON.
    pub compact: bool,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `history.capacity`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Get the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rockwatch")
        .join("config.toml")
}
