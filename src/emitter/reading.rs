//! reading.rs
//! Sensor reading payload: one JSON object per emission cycle.
//! - Measurement drawn uniformly from the sensor kind's calibrated range
//! - Timestamp in ISO-8601 (UTC, millisecond precision) like the upstream dashboards expect

use chrono::{SecondsFormat, Utc};
use rand::random_range;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Temperatura,
    Ph,
    Oxigeno,
}

impl SensorKind {
    /// Half-open range of in-calibration values for this sensor kind.
    pub fn value_range(&self) -> (f64, f64) {
        match self {
            SensorKind::Temperatura => (68.0, 88.0),
            SensorKind::Ph => (6.0, 8.0),
            SensorKind::Oxigeno => (2.0, 11.0),
        }
    }

    /// Tag used in the `sensorType` JSON field.
    pub fn tag(&self) -> &'static str {
        match self {
            SensorKind::Temperatura => "temperatura",
            SensorKind::Ph => "ph",
            SensorKind::Oxigeno => "oxigeno",
        }
    }
}

/// One sensor reading, built fresh per cycle and discarded after the
/// response check. Serializes to `{"sensorType": ..., "measurement": ...,
/// "timestamp": ...}` — the exact body the broker and monitor accept.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub sensor_type: &'static str,
    pub measurement: f64,
    pub timestamp: String,
}

impl SensorReading {
    /// Builds a reading with a random in-range measurement and the current
    /// wall-clock time.
    pub fn generate(kind: SensorKind) -> Self {
        let (lo, hi) = kind.value_range();
        Self {
            sensor_type: kind.tag(),
            measurement: random_range(lo..hi),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn measurements_stay_in_kind_range() {
        for kind in [SensorKind::Temperatura, SensorKind::Ph, SensorKind::Oxigeno] {
            let (lo, hi) = kind.value_range();
            for _ in 0..1_000 {
                let reading = SensorReading::generate(kind);
                assert!(
                    reading.measurement >= lo && reading.measurement < hi,
                    "{} out of [{}, {}) for {:?}",
                    reading.measurement,
                    lo,
                    hi,
                    kind
                );
            }
        }
    }

    #[test]
    fn timestamp_parses_and_is_non_decreasing() {
        let mut previous = None;
        for _ in 0..50 {
            let reading = SensorReading::generate(SensorKind::Temperatura);
            let parsed = DateTime::parse_from_rfc3339(&reading.timestamp)
                .expect("timestamp must be valid ISO-8601");
            if let Some(prev) = previous {
                assert!(parsed >= prev, "timestamps went backwards");
            }
            previous = Some(parsed);
        }
    }

    #[test]
    fn serializes_with_expected_keys() {
        let reading = SensorReading::generate(SensorKind::Temperatura);
        let value = serde_json::to_value(&reading).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 3);
        assert_eq!(obj["sensorType"], "temperatura");
        assert!(obj["measurement"].is_number());
        assert!(obj["timestamp"].is_string());
    }
}
