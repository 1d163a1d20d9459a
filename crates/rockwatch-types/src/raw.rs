//! Inbound wire form of a sensor event.
//!
//! The real-time feed sends loosely-typed JSON objects. Any numeric field may be
//! absent, `null` or a numeric string; the timestamp may be epoch milliseconds or
//! an RFC 3339 string. [`RawReading::into_reading`] turns whatever arrived into a
//! complete [`Reading`] without failing.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{ParseError, ParseResult};
use crate::types::{Reading, celsius_to_fahrenheit};

/// Timestamp as sent by the feed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RawTimestamp {
    /// Milliseconds since the Unix epoch.
    EpochMillis(f64),
    /// RFC 3339 datetime, or a numeric string holding epoch milliseconds.
    Text(String),
}

impl RawTimestamp {
    /// Interpret the timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidTimestamp`] if the value is not finite, falls
    /// outside years 0 to 9999, or is a string that is neither RFC 3339 nor numeric.
    pub fn resolve(&self) -> ParseResult<OffsetDateTime> {
        match self {
            RawTimestamp::EpochMillis(ms) => from_epoch_millis(*ms),
            RawTimestamp::Text(text) => {
                let text = text.trim();
                if let Ok(ts) = OffsetDateTime::parse(text, &Rfc3339) {
                    return within_rfc3339_range(ts, text);
                }
                match text.parse::<f64>() {
                    Ok(ms) => from_epoch_millis(ms),
                    Err(_) => Err(ParseError::InvalidTimestamp(text.to_string())),
                }
            }
        }
    }
}

fn from_epoch_millis(ms: f64) -> ParseResult<OffsetDateTime> {
    if !ms.is_finite() {
        return Err(ParseError::InvalidTimestamp(ms.to_string()));
    }
    let nanos = (ms * 1_000_000.0) as i128;
    let ts = OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .map_err(|e| ParseError::InvalidTimestamp(format!("{ms}: {e}")))?;
    within_rfc3339_range(ts, &ms.to_string())
}

/// Reject datetimes whose year (local or UTC) RFC 3339 cannot represent.
fn within_rfc3339_range(ts: OffsetDateTime, original: &str) -> ParseResult<OffsetDateTime> {
    // 0000-01-01T00:00:00Z ..= 9999-12-31T23:59:59Z
    const UTC_SECONDS: std::ops::RangeInclusive<i64> = -62_167_219_200..=253_402_300_799;
    if (0..=9999).contains(&ts.year()) && UTC_SECONDS.contains(&ts.unix_timestamp()) {
        Ok(ts)
    } else {
        Err(ParseError::InvalidTimestamp(original.to_string()))
    }
}

/// Body of an inbound `sensorData` event, exactly as received.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawReading {
    /// CO2 concentration in ppm.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "lenient::number",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub co2: Option<f64>,
    /// Temperature in degrees Celsius.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "lenient::number",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub temperature: Option<f64>,
    /// Temperature in degrees Fahrenheit.
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "temperatureF",
            alias = "temperature_f",
            default,
            deserialize_with = "lenient::number",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub temperature_f: Option<f64>,
    /// Relative humidity percentage.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "lenient::number",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub humidity: Option<f64>,
    /// Capture time.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "lenient::timestamp",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub timestamp: Option<RawTimestamp>,
}

impl RawReading {
    /// Decode an event body from JSON.
    ///
    /// Only payloads that are not JSON objects are rejected; unknown keys are
    /// ignored and unusable field values are treated as absent.
    ///
    /// ```
    /// use rockwatch_types::RawReading;
    ///
    /// let raw = RawReading::from_json(r#"{"co2": 650, "humidity": "50"}"#).unwrap();
    /// assert_eq!(raw.co2, Some(650.0));
    /// assert_eq!(raw.humidity, Some(50.0));
    /// assert_eq!(raw.temperature, None);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidJson`] or [`ParseError::NotAnObject`].
    #[cfg(feature = "serde")]
    pub fn from_json(payload: &str) -> ParseResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    /// Decode an event body from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NotAnObject`] for non-object values.
    #[cfg(feature = "serde")]
    pub fn from_value(value: serde_json::Value) -> ParseResult<Self> {
        use serde_json::Value;

        let kind = match &value {
            Value::Object(_) => None,
            Value::Null => Some("null"),
            Value::Bool(_) => Some("boolean"),
            Value::Number(_) => Some("number"),
            Value::String(_) => Some("string"),
            Value::Array(_) => Some("array"),
        };
        if let Some(kind) = kind {
            return Err(ParseError::NotAnObject(kind));
        }
        serde_json::from_value(value).map_err(|e| ParseError::InvalidJson(e.to_string()))
    }

    /// Names of the numeric fields that were absent and will default to zero.
    ///
    /// `temperatureF` is not reported since it is derived from `temperature`.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.co2.is_none() {
            missing.push("co2");
        }
        if self.temperature.is_none() {
            missing.push("temperature");
        }
        if self.humidity.is_none() {
            missing.push("humidity");
        }
        missing
    }

    /// Resolve the timestamp, if one was sent.
    #[must_use]
    pub fn resolve_timestamp(&self) -> Option<ParseResult<OffsetDateTime>> {
        self.timestamp.as_ref().map(RawTimestamp::resolve)
    }

    /// Convert into a complete [`Reading`].
    ///
    /// Absent numeric fields become `0.0`. An absent `temperatureF` is derived
    /// from `temperature` when that was sent. An absent or unusable timestamp
    /// becomes `received_at`.
    #[must_use]
    pub fn into_reading(self, received_at: OffsetDateTime) -> Reading {
        let timestamp = match self.resolve_timestamp() {
            Some(Ok(ts)) => ts,
            _ => received_at,
        };
        let temperature_f = self
            .temperature_f
            .or(self.temperature.map(celsius_to_fahrenheit))
            .unwrap_or(0.0);

        Reading {
            co2: self.co2.unwrap_or(0.0),
            temperature: self.temperature.unwrap_or(0.0),
            temperature_f,
            humidity: self.humidity.unwrap_or(0.0),
            timestamp,
        }
    }
}

impl From<&Reading> for RawReading {
    fn from(reading: &Reading) -> Self {
        let millis = reading.timestamp.unix_timestamp_nanos() / 1_000_000;
        Self {
            co2: Some(reading.co2),
            temperature: Some(reading.temperature),
            temperature_f: Some(reading.temperature_f),
            humidity: Some(reading.humidity),
            timestamp: Some(RawTimestamp::EpochMillis(millis as f64)),
        }
    }
}

#[cfg(feature = "serde")]
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::RawTimestamp;

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }))
    }

    pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<RawTimestamp>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| match v {
            Value::Number(n) => n.as_f64().map(RawTimestamp::EpochMillis),
            Value::String(s) => Some(RawTimestamp::Text(s)),
            _ => None,
        }))
    }
}
