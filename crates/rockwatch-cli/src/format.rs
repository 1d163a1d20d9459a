//! Output formatting utilities for text, JSON, and CSV output.

use anyhow::Result;
use rockwatch_core::{DashboardSnapshot, MetricStats, ValidationWarning};
use rockwatch_types::{Reading, RiskAssessment, RiskLevel};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use Fahrenheit for temperatures.
    pub fahrenheit: bool,
    /// Omit header row in CSV output.
    pub no_header: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool, fahrenheit: bool) -> Self {
        Self {
            no_color,
            fahrenheit,
            ..Self::default()
        }
    }

    /// Create with no_header option for CSV output.
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    /// Create with compact JSON option.
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    /// Format a reading's temperature with the configured unit.
    ///
    /// Fahrenheit uses the value reported by the sensor rather than
    /// converting again.
    #[must_use]
    pub fn format_temp(&self, reading: &Reading) -> String {
        if self.fahrenheit {
            format!("{:.1}°F", reading.temperature_f)
        } else {
            format!("{:.1}°C", reading.temperature)
        }
    }

    fn temp_unit(&self) -> &'static str {
        if self.fahrenheit { "F" } else { "C" }
    }
}

/// Escape a value for CSV output.
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn format_clock(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| "??:??:??".to_string())
}

fn format_rfc3339(timestamp: OffsetDateTime) -> String {
    timestamp.format(&Rfc3339).unwrap_or_default()
}

// ============================================================================
// Single assessment
// ============================================================================

/// Format an assessment as a text panel.
pub fn format_assessment_text(
    reading: &Reading,
    assessment: &RiskAssessment,
    warnings: &[ValidationWarning],
    opts: &FormatOptions,
) -> String {
    let nc = opts.no_color;
    let mut out = String::new();

    out.push_str(&style::format_title("Rockfall Risk Assessment", nc));
    out.push('\n');
    out.push_str(&format!(
        "  Level:     {} score {}/10  {}\n",
        style::format_level_badge(assessment.level, nc),
        assessment.score,
        style::format_score_bar(assessment.score, nc)
    ));
    out.push_str(&format!("  Timeframe: {}\n", assessment.timeframe));
    out.push_str(&format!("  CO2:       {:.1} ppm\n", reading.co2));
    out.push_str(&format!("  Temp:      {}\n", opts.format_temp(reading)));
    out.push_str(&format!("  Humidity:  {:.1}%\n", reading.humidity));
    out.push_str("  Factors:\n");
    for line in assessment.summary_lines() {
        out.push_str(&format!("    - {}\n", line));
    }
    for warning in warnings {
        out.push_str(&style::format_warning(&warning.to_string(), nc));
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct AssessmentRecord<'a> {
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    co2: f64,
    temperature: f64,
    temperature_unit: &'static str,
    humidity: f64,
    score: u8,
    level: RiskLevel,
    factors: Vec<&'static str>,
    timeframe: &'a str,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    warnings: &'a [ValidationWarning],
}

impl<'a> AssessmentRecord<'a> {
    fn new(
        reading: &Reading,
        assessment: &'a RiskAssessment,
        warnings: &'a [ValidationWarning],
        opts: &FormatOptions,
    ) -> Self {
        Self {
            timestamp: reading.timestamp,
            co2: reading.co2,
            temperature: if opts.fahrenheit {
                reading.temperature_f
            } else {
                reading.temperature
            },
            temperature_unit: opts.temp_unit(),
            humidity: reading.humidity,
            score: assessment.score,
            level: assessment.level,
            factors: assessment.factor_descriptions(),
            timeframe: &assessment.timeframe,
            warnings,
        }
    }
}

/// Format an assessment as JSON.
pub fn format_assessment_json(
    reading: &Reading,
    assessment: &RiskAssessment,
    warnings: &[ValidationWarning],
    opts: &FormatOptions,
) -> Result<String> {
    opts.as_json(&AssessmentRecord::new(reading, assessment, warnings, opts))
}

// ============================================================================
// Feed lines (replay / simulate)
// ============================================================================

/// Format one assessed reading as a single line of a live feed.
pub fn format_feed_line(
    reading: &Reading,
    assessment: &RiskAssessment,
    previous_score: Option<u8>,
    opts: &FormatOptions,
) -> String {
    let nc = opts.no_color;
    format!(
        "{}  {} {:>2} {}  {:>7.1} ppm  {:>7}  {:>5.1}%  {}\n",
        style::dimmed(&format_clock(reading.timestamp), nc),
        style::format_level(assessment.level, 8, nc),
        assessment.score,
        style::trend_indicator(assessment.score, previous_score, nc),
        reading.co2,
        opts.format_temp(reading),
        reading.humidity,
        style::dimmed(&assessment.summary_lines().join("; "), nc),
    )
}

/// Format one assessed reading as a compact JSON line.
pub fn format_feed_json(
    reading: &Reading,
    assessment: &RiskAssessment,
    warnings: &[ValidationWarning],
    opts: &FormatOptions,
) -> Result<String> {
    let record = AssessmentRecord::new(reading, assessment, warnings, opts);
    Ok(serde_json::to_string(&record)? + "\n")
}

/// CSV header for feed output.
pub fn format_csv_header(opts: &FormatOptions) -> String {
    format!(
        "timestamp,co2_ppm,temperature_{},humidity_pct,score,level,factors\n",
        opts.temp_unit().to_lowercase()
    )
}

/// Format one assessed reading as a CSV row.
pub fn format_csv_line(
    reading: &Reading,
    assessment: &RiskAssessment,
    opts: &FormatOptions,
) -> String {
    let temperature = if opts.fahrenheit {
        reading.temperature_f
    } else {
        reading.temperature
    };
    format!(
        "{},{:.1},{:.1},{:.1},{},{},{}\n",
        format_rfc3339(reading.timestamp),
        reading.co2,
        temperature,
        reading.humidity,
        assessment.score,
        assessment.level,
        csv_escape(&assessment.factor_descriptions().join("; "))
    )
}

// ============================================================================
// Session summary
// ============================================================================

fn format_metric(name: &str, stats: Option<&MetricStats>, unit: &str) -> String {
    match stats {
        Some(s) => format!(
            "  {:<10} min {:>7.1}{unit}  max {:>7.1}{unit}  mean {:>7.1}{unit}\n",
            name, s.min, s.max, s.mean
        ),
        None => format!("  {:<10} -\n", name),
    }
}

/// Format the end-of-feed summary as text.
pub fn format_summary_text(snapshot: &DashboardSnapshot, opts: &FormatOptions) -> String {
    let nc = opts.no_color;
    let mut out = String::new();

    out.push('\n');
    out.push_str(&style::format_title("Session Summary", nc));
    out.push('\n');
    out.push_str(&format!(
        "  Connection: {}\n",
        style::format_connection(snapshot.state, nc)
    ));
    out.push_str(&format!(
        "  Readings:   {} ingested, {} in history, {} predictions\n",
        snapshot.ingested,
        snapshot.history.len(),
        snapshot.predictions.len()
    ));

    if let Some(assessment) = &snapshot.assessment {
        out.push_str(&format!(
            "  Current:    {} score {} - {}\n",
            style::format_level_badge(assessment.level, nc),
            assessment.score,
            assessment.timeframe
        ));
    }

    out.push_str("\n  Recent predictions:\n");
    for level in RiskLevel::ALL {
        out.push_str(&format!(
            "    {} {}\n",
            style::format_level(level, 8, nc),
            snapshot.distribution.count(level)
        ));
    }

    let stats = &snapshot.stats;
    if stats.count > 0 {
        out.push_str(&format!("\n  Window statistics ({} readings):\n", stats.count));
        out.push_str(&format_metric("CO2", stats.co2.as_ref(), " ppm"));
        out.push_str(&format_metric("Temp", stats.temperature.as_ref(), "°C"));
        out.push_str(&format_metric("Humidity", stats.humidity.as_ref(), "%"));
        if let Some(peak) = stats.peak_score {
            out.push_str(&format!(
                "  {:<10} {} {}\n",
                "Peak score",
                peak,
                style::format_level_badge(RiskLevel::from_score(peak), nc)
            ));
        }
    }
    out
}

/// Format the end-of-feed summary as JSON.
pub fn format_summary_json(snapshot: &DashboardSnapshot, opts: &FormatOptions) -> Result<String> {
    opts.as_json(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rockwatch_core::assess;
    use rockwatch_types::RiskFactor;
    use time::macros::datetime;

    fn sample() -> (Reading, RiskAssessment) {
        let reading = Reading::builder()
            .co2(1050.0)
            .temperature(42.0)
            .humidity(96.0)
            .timestamp(datetime!(2024-05-01 12:30:15 UTC))
            .build();
        let assessment = assess(&reading);
        (reading, assessment)
    }

    fn plain() -> FormatOptions {
        FormatOptions::new(true, false)
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("simple"), "simple");
        assert_eq!(csv_escape("a, b"), "\"a, b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_format_temp_uses_reported_fahrenheit() {
        let reading = Reading::builder()
            .temperature(20.0)
            .temperature_f(68.4)
            .build();
        assert_eq!(plain().format_temp(&reading), "20.0°C");
        assert_eq!(FormatOptions::new(true, true).format_temp(&reading), "68.4°F");
    }

    #[test]
    fn test_assessment_text_lists_factors() {
        let (reading, assessment) = sample();
        let text = format_assessment_text(&reading, &assessment, &[], &plain());
        assert!(text.contains("[CRITICAL] score 10/10"));
        assert!(text.contains("Immediate action required"));
        assert!(text.contains("    - High CO₂ levels detected"));
        assert!(text.contains("    - Extreme temperature conditions"));
        assert!(text.contains("    - Critical humidity - water infiltration risk"));
    }

    #[test]
    fn test_assessment_text_normal_conditions() {
        let reading = Reading::builder()
            .co2(450.0)
            .temperature(20.0)
            .humidity(50.0)
            .build();
        let assessment = assess(&reading);
        let text = format_assessment_text(&reading, &assessment, &[], &plain());
        assert!(text.contains("[LOW] score 0/10"));
        assert!(text.contains("All parameters within normal range"));
    }

    #[test]
    fn test_assessment_json() {
        let (reading, assessment) = sample();
        let json = format_assessment_json(&reading, &assessment, &[], &plain()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["score"], 10);
        assert_eq!(value["level"], "CRITICAL");
        assert_eq!(value["temperature_unit"], "C");
        assert_eq!(value["timestamp"], "2024-05-01T12:30:15Z");
        assert_eq!(value["factors"][0], RiskFactor::HighCo2.description());
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn test_assessment_json_includes_warnings() {
        let (reading, assessment) = sample();
        let warnings = vec![ValidationWarning::AllZeros];
        let json = format_feed_json(&reading, &assessment, &warnings, &plain()).unwrap();
        assert!(json.ends_with('\n'));
        assert_eq!(json.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["warnings"][0]["kind"], "all_zeros");
    }

    #[test]
    fn test_feed_line() {
        let (reading, assessment) = sample();
        let line = format_feed_line(&reading, &assessment, Some(4), &plain());
        assert!(line.starts_with("12:30:15  CRITICAL 10 ^"));
        assert!(line.contains("1050.0 ppm"));
        assert!(line.contains("42.0°C"));
    }

    #[test]
    fn test_csv_output() {
        let (reading, assessment) = sample();
        let opts = plain();
        assert_eq!(
            format_csv_header(&opts),
            "timestamp,co2_ppm,temperature_c,humidity_pct,score,level,factors\n"
        );
        let row = format_csv_line(&reading, &assessment, &opts);
        assert!(row.starts_with("2024-05-01T12:30:15Z,1050.0,42.0,96.0,10,CRITICAL,"));
        assert_eq!(row.lines().count(), 1);
    }

    #[test]
    fn test_as_json_compact() {
        let opts = plain().with_compact(true);
        assert_eq!(opts.as_json(&[1, 2]).unwrap(), "[1,2]\n");
    }
}
