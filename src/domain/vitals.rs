// Vitals record domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One reading as delivered by the device-telemetry service.
///
/// The shape is untrusted: every vital may be missing and the timestamp
/// encoding varies between devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVitalsRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub device_id: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub bpm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub spo2: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_critical: bool,
}

// Field-level leniency: one malformed field must never cost the whole batch.

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_timestamp(deserializer)?.unwrap_or_default())
}

/// Strings pass through; any other non-null value keeps its JSON text so it
/// stays visible on the record as an unparsed timestamp.
fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

impl RawVitalsRecord {
    pub fn new(device_id: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp: Some(timestamp.into()),
            bpm: None,
            spo2: None,
            temperature: None,
            temp: None,
            is_critical: false,
        }
    }

    /// `temperature` wins over the `temp` alias.
    pub fn resolved_temperature(&self) -> Option<f64> {
        self.temperature.or(self.temp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    #[serde(flatten)]
    pub raw: RawVitalsRecord,
    pub parsed_timestamp: Option<DateTime<Utc>>,
    pub temperature_resolved: Option<f64>,
}

impl NormalizedRecord {
    /// Ordering key used by the aggregator. Untimed records collapse to the epoch.
    pub fn sort_key_ms(&self) -> i64 {
        self.parsed_timestamp
            .map(|t| t.timestamp_millis())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VitalStatus {
    Normal,
    Abnormal,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VitalStatuses {
    pub bpm_status: VitalStatus,
    pub spo2_status: VitalStatus,
    pub temperature_status: VitalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: NormalizedRecord,
    #[serde(flatten)]
    pub statuses: VitalStatuses,
}

impl ClassifiedRecord {
    pub fn value_of(&self, vital: Vital) -> Option<f64> {
        match vital {
            Vital::HeartRate => self.record.raw.bpm,
            Vital::OxygenSaturation => self.record.raw.spo2,
            Vital::Temperature => self.record.temperature_resolved,
        }
    }

    pub fn status_of(&self, vital: Vital) -> VitalStatus {
        match vital {
            Vital::HeartRate => self.statuses.bpm_status,
            Vital::OxygenSaturation => self.statuses.spo2_status,
            Vital::Temperature => self.statuses.temperature_status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Vital {
    HeartRate,
    OxygenSaturation,
    Temperature,
}

impl Vital {
    pub const ALL: [Vital; 3] = [Vital::HeartRate, Vital::OxygenSaturation, Vital::Temperature];

    pub fn unit(self) -> &'static str {
        match self {
            Vital::HeartRate => "bpm",
            Vital::OxygenSaturation => "%",
            Vital::Temperature => "°C",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Vital::HeartRate => "Heart Rate",
            Vital::OxygenSaturation => "SpO2",
            Vital::Temperature => "Temperature",
        }
    }
}
