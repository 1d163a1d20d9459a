//! Heuristic rockfall risk classification.
//!
//! A reading is scored by three independent rule groups (CO₂, temperature,
//! humidity). Within a group the most extreme matching rule wins and the others
//! are skipped; the weights of the winning rules are summed into a score, and
//! the score is mapped onto a [`RiskLevel`].
//!
//! | Group | Rule (default thresholds) | Weight |
//! |-------|---------------------------|--------|
//! | CO₂ | `> 1000` ppm | 4 |
//! | | `> 800` ppm | 3 |
//! | | `> 600` ppm | 2 |
//! | Temperature | `> 40` or `< 0` °C | 3 |
//! | | `> 35` or `< 5` °C | 2 |
//! | Humidity | `> 95` % | 3 |
//! | | `> 85` % | 2 |
//! | | `< 10` % | 1 |
//!
//! Scores of 7 and above are critical, 4 and above high, 2 and above medium.
//!
//! # Example
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
//! Comparisons are strict, so a NaN input never matches a rule and contributes
//! nothing. Negative values are not clamped.

use serde::{Deserialize, Serialize};

use rockwatch_types::{Reading, RiskAssessment, RiskFactor, RiskLevel};

use crate::error::{Error, Result};

/// Threshold configuration for the classifier.
///
/// All comparisons are strict: a value equal to a threshold does not trigger it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// CO2 above this is a moderate increase (ppm).
    pub co2_moderate: f64,
    /// CO2 above this is elevated (ppm).
    pub co2_elevated: f64,
    /// CO2 above this is high (ppm).
    pub co2_high: f64,
    /// Temperatures below this are extreme (°C).
    pub temperature_extreme_low: f64,
    /// Temperatures below this stress the rock (°C).
    pub temperature_stress_low: f64,
    /// Temperatures above this stress the rock (°C).
    pub temperature_stress_high: f64,
    /// Temperatures above this are extreme (°C).
    pub temperature_extreme_high: f64,
    /// Humidity below this is very dry (%).
    pub humidity_dry: f64,
    /// Humidity above this is high (%).
    pub humidity_high: f64,
    /// Humidity above this is critical (%).
    pub humidity_critical: f64,
    /// Minimum score for [`RiskLevel::Medium`].
    pub medium_score: u8,
    /// Minimum score for [`RiskLevel::High`].
    pub high_score: u8,
    /// Minimum score for [`RiskLevel::Critical`].
    pub critical_score: u8,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            co2_moderate: 600.0,
            co2_elevated: 800.0,
            co2_high: 1000.0,
            temperature_extreme_low: 0.0,
            temperature_stress_low: 5.0,
            temperature_stress_high: 35.0,
            temperature_extreme_high: 40.0,
            humidity_dry: 10.0,
            humidity_high: 85.0,
            humidity_critical: 95.0,
            medium_score: 2,
            high_score: 4,
            critical_score: 7,
        }
    }
}

impl ClassifierConfig {
    /// Validate the configuration.
    ///
    /// Checks that all thresholds are finite and that each group is ordered
    /// from the normal band outwards, so that moving a value further from
    /// normal can never lower its contribution.
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("co2_moderate", self.co2_moderate),
            ("co2_elevated", self.co2_elevated),
            ("co2_high", self.co2_high),
            ("temperature_extreme_low", self.temperature_extreme_low),
            ("temperature_stress_low", self.temperature_stress_low),
            ("temperature_stress_high", self.temperature_stress_high),
            ("temperature_extreme_high", self.temperature_extreme_high),
            ("humidity_dry", self.humidity_dry),
            ("humidity_high", self.humidity_high),
            ("humidity_critical", self.humidity_critical),
        ];
        if let Some((name, _)) = thresholds.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::invalid_config(format!("{name} must be finite")));
        }

        if !(self.co2_moderate < self.co2_elevated && self.co2_elevated < self.co2_high) {
            return Err(Error::invalid_config(
                "CO2 thresholds must satisfy co2_moderate < co2_elevated < co2_high",
            ));
        }
        if !(self.temperature_extreme_low <= self.temperature_stress_low
            && self.temperature_stress_low < self.temperature_stress_high
            && self.temperature_stress_high <= self.temperature_extreme_high)
        {
            return Err(Error::invalid_config(
                "temperature thresholds must satisfy extreme_low <= stress_low < stress_high <= extreme_high",
            ));
        }
        if !(self.humidity_dry < self.humidity_high && self.humidity_high < self.humidity_critical)
        {
            return Err(Error::invalid_config(
                "humidity thresholds must satisfy humidity_dry < humidity_high < humidity_critical",
            ));
        }
        if !(0 < self.medium_score
            && self.medium_score < self.high_score
            && self.high_score < self.critical_score)
        {
            return Err(Error::invalid_config(
                "score cut-offs must satisfy 0 < medium_score < high_score < critical_score",
            ));
        }
        Ok(())
    }
}

/// Risk classifier for sensor readings.
#[derive(Debug, Clone, Default)]
pub struct RiskClassifier {
    config: ClassifierConfig,
}

impl RiskClassifier {
    /// Create a classifier with the given configuration.
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Score a reading.
    ///
    /// Factors are listed in evaluation order: CO₂, then temperature, then humidity.
    pub fn assess(&self, reading: &Reading) -> RiskAssessment {
        let factors: Vec<RiskFactor> = [
            self.co2_factor(reading.co2),
            self.temperature_factor(reading.temperature),
            self.humidity_factor(reading.humidity),
        ]
        .into_iter()
        .flatten()
        .collect();

        let score = factors.iter().map(RiskFactor::weight).sum();
        RiskAssessment::new(score, self.level_for(score), factors)
    }

    /// Map a score onto a level using the configured cut-offs.
    pub fn level_for(&self, score: u8) -> RiskLevel {
        if score >= self.config.critical_score {
            RiskLevel::Critical
        } else if score >= self.config.high_score {
            RiskLevel::High
        } else if score >= self.config.medium_score {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// The CO2 rule triggered by `co2`, if any.
    pub fn co2_factor(&self, co2: f64) -> Option<RiskFactor> {
        if co2 > self.config.co2_high {
            Some(RiskFactor::HighCo2)
        } else if co2 > self.config.co2_elevated {
            Some(RiskFactor::ElevatedCo2)
        } else if co2 > self.config.co2_moderate {
            Some(RiskFactor::ModerateCo2)
        } else {
            None
        }
    }

    /// The temperature rule triggered by `temperature`, if any.
    pub fn temperature_factor(&self, temperature: f64) -> Option<RiskFactor> {
        let c = &self.config;
        if temperature > c.temperature_extreme_high || temperature < c.temperature_extreme_low {
            Some(RiskFactor::ExtremeTemperature)
        } else if temperature > c.temperature_stress_high || temperature < c.temperature_stress_low
        {
            Some(RiskFactor::TemperatureStress)
        } else {
            None
        }
    }

    /// The humidity rule triggered by `humidity`, if any.
    pub fn humidity_factor(&self, humidity: f64) -> Option<RiskFactor> {
        if humidity > self.config.humidity_critical {
            Some(RiskFactor::CriticalHumidity)
        } else if humidity > self.config.humidity_high {
            Some(RiskFactor::HighHumidity)
        } else if humidity < self.config.humidity_dry {
            Some(RiskFactor::VeryDry)
        } else {
            None
        }
    }
}

/// Score a reading with the default thresholds.
pub fn assess(reading: &Reading) -> RiskAssessment {
    RiskClassifier::default().assess(reading)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(co2: f64, temperature: f64, humidity: f64) -> Reading {
        Reading::builder()
            .co2(co2)
            .temperature(temperature)
            .humidity(humidity)
            .build()
    }

    #[test]
    fn test_normal_conditions() {
        let a = assess(&reading(450.0, 20.0, 50.0));
        assert_eq!(a.score, 0);
        assert_eq!(a.level, RiskLevel::Low);
        assert!(a.factors.is_empty());
        assert_eq!(a.timeframe, "Conditions stable");
    }

    #[test]
    fn test_all_rules_triggered() {
        let a = assess(&reading(1050.0, 42.0, 96.0));
        assert_eq!(a.score, 10);
        assert_eq!(a.level, RiskLevel::Critical);
        assert_eq!(
            a.factor_descriptions(),
            vec![
                "High CO₂ levels detected",
                "Extreme temperature conditions",
                "Critical humidity - water infiltration risk",
            ]
        );
    }

    #[test]
    fn test_moderate_co2_only() {
        let a = assess(&reading(650.0, 20.0, 50.0));
        assert_eq!(a.score, 2);
        assert_eq!(a.level, RiskLevel::Medium);
        assert_eq!(a.factors, vec![RiskFactor::ModerateCo2]);
    }

    #[test]
    fn test_co2_boundaries() {
        let c = RiskClassifier::default();
        assert_eq!(c.co2_factor(600.0), None);
        assert_eq!(c.co2_factor(600.1), Some(RiskFactor::ModerateCo2));
        assert_eq!(c.co2_factor(800.0), Some(RiskFactor::ModerateCo2));
        assert_eq!(c.co2_factor(800.1), Some(RiskFactor::ElevatedCo2));
        assert_eq!(c.co2_factor(1000.0), Some(RiskFactor::ElevatedCo2));
        assert_eq!(c.co2_factor(1000.1), Some(RiskFactor::HighCo2));
    }

    #[test]
    fn test_temperature_boundaries() {
        let c = RiskClassifier::default();
        assert_eq!(c.temperature_factor(5.0), None);
        assert_eq!(c.temperature_factor(35.0), None);
        assert_eq!(c.temperature_factor(4.9), Some(RiskFactor::TemperatureStress));
        assert_eq!(c.temperature_factor(0.0), Some(RiskFactor::TemperatureStress));
        assert_eq!(c.temperature_factor(-0.1), Some(RiskFactor::ExtremeTemperature));
        assert_eq!(c.temperature_factor(35.1), Some(RiskFactor::TemperatureStress));
        assert_eq!(c.temperature_factor(40.0), Some(RiskFactor::TemperatureStress));
        assert_eq!(c.temperature_factor(40.1), Some(RiskFactor::ExtremeTemperature));
    }

    #[test]
    fn test_humidity_boundaries() {
        let c = RiskClassifier::default();
        assert_eq!(c.humidity_factor(10.0), None);
        assert_eq!(c.humidity_factor(85.0), None);
        assert_eq!(c.humidity_factor(9.9), Some(RiskFactor::VeryDry));
        assert_eq!(c.humidity_factor(85.1), Some(RiskFactor::HighHumidity));
        assert_eq!(c.humidity_factor(95.0), Some(RiskFactor::HighHumidity));
        assert_eq!(c.humidity_factor(95.1), Some(RiskFactor::CriticalHumidity));
    }

    #[test]
    fn test_level_boundaries() {
        // score 7: high CO2 (4) + extreme temperature (3)
        assert_eq!(assess(&reading(1100.0, 45.0, 50.0)).level, RiskLevel::Critical);
        // score 6: high CO2 (4) + stress temperature (2)
        let a = assess(&reading(1100.0, 36.0, 50.0));
        assert_eq!((a.score, a.level), (6, RiskLevel::High));
        // score 4: high CO2
        let a = assess(&reading(1100.0, 20.0, 50.0));
        assert_eq!((a.score, a.level), (4, RiskLevel::High));
        // score 3: elevated CO2
        let a = assess(&reading(900.0, 20.0, 50.0));
        assert_eq!((a.score, a.level), (3, RiskLevel::Medium));
        // score 2: high humidity
        let a = assess(&reading(400.0, 20.0, 90.0));
        assert_eq!((a.score, a.level), (2, RiskLevel::Medium));
        // score 1: very dry
        let a = assess(&reading(400.0, 20.0, 5.0));
        assert_eq!((a.score, a.level), (1, RiskLevel::Low));
    }

    #[test]
    fn test_nan_contributes_nothing() {
        let a = assess(&reading(f64::NAN, f64::NAN, f64::NAN));
        assert_eq!(a.score, 0);
        assert_eq!(a.level, RiskLevel::Low);
    }

    #[test]
    fn test_zero_defaults_score() {
        // An all-zero reading (e.g. an empty event) is cold and dry.
        let a = assess(&reading(0.0, 0.0, 0.0));
        assert_eq!(
            a.factors,
            vec![RiskFactor::TemperatureStress, RiskFactor::VeryDry]
        );
        assert_eq!(a.score, 3);
    }

    #[test]
    fn test_custom_cutoffs() {
        let config = ClassifierConfig {
            medium_score: 1,
            high_score: 2,
            critical_score: 3,
            ..Default::default()
        };
        let c = RiskClassifier::new(config).unwrap();
        assert_eq!(c.level_for(1), RiskLevel::Medium);
        assert_eq!(c.assess(&reading(900.0, 20.0, 50.0)).level, RiskLevel::Critical);
    }

    #[test]
    fn test_config_validation() {
        assert!(ClassifierConfig::default().validate().is_ok());

        let bad = ClassifierConfig {
            co2_elevated: 500.0,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(Error::InvalidConfig(_))));

        let bad = ClassifierConfig {
            temperature_extreme_high: 30.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = ClassifierConfig {
            humidity_critical: f64::NAN,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = ClassifierConfig {
            medium_score: 0,
            ..Default::default()
        };
        assert!(RiskClassifier::new(bad).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn reading(co2: f64, temperature: f64, humidity: f64) -> Reading {
        Reading::builder()
            .co2(co2)
            .temperature(temperature)
            .humidity(humidity)
            .build()
    }

    fn any_value() -> impl Strategy<Value = f64> {
        prop_oneof![
            -1.0e6f64..1.0e6,
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
        ]
    }

    proptest! {
        /// Classification is total and the score stays within 0..=10.
        #[test]
        fn assess_never_panics(co2 in any_value(), t in any_value(), h in any_value()) {
            let a = assess(&reading(co2, t, h));
            prop_assert!(a.score <= 10);
            prop_assert_eq!(a.level, RiskLevel::from_score(a.score));
            prop_assert_eq!(
                a.score,
                a.factors.iter().map(RiskFactor::weight).sum::<u8>()
            );
        }

        /// Readings inside every normal band are low risk with no factors.
        #[test]
        fn normal_band_is_low(co2 in 0.0f64..=600.0, t in 5.0f64..=35.0, h in 10.0f64..=85.0) {
            let a = assess(&reading(co2, t, h));
            prop_assert_eq!(a.score, 0);
            prop_assert_eq!(a.level, RiskLevel::Low);
            prop_assert!(a.factors.is_empty());
        }

        /// Raising CO2 never lowers the score.
        #[test]
        fn co2_is_monotonic(a in 0.0f64..3000.0, b in 0.0f64..3000.0, t in -20.0f64..60.0, h in 0.0f64..100.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(assess(&reading(lo, t, h)).score <= assess(&reading(hi, t, h)).score);
        }

        /// Moving temperature away from the normal band never lowers the score.
        #[test]
        fn temperature_is_monotonic(d1 in 0.0f64..50.0, d2 in 0.0f64..50.0, co2 in 0.0f64..2000.0, h in 0.0f64..100.0) {
            let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            prop_assert!(assess(&reading(co2, 35.0 + near, h)).score <= assess(&reading(co2, 35.0 + far, h)).score);
            prop_assert!(assess(&reading(co2, 5.0 - near, h)).score <= assess(&reading(co2, 5.0 - far, h)).score);
        }

        /// Moving humidity away from the normal band never lowers the score.
        #[test]
        fn humidity_is_monotonic(d1 in 0.0f64..15.0, d2 in 0.0f64..15.0, co2 in 0.0f64..2000.0, t in -20.0f64..60.0) {
            let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            prop_assert!(assess(&reading(co2, t, 85.0 + near)).score <= assess(&reading(co2, t, 85.0 + far)).score);
            prop_assert!(assess(&reading(co2, t, 10.0 - near)).score <= assess(&reading(co2, t, 10.0 - far)).score);
        }
    }
}
