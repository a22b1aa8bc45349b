// Threshold classifier - clinical normal/abnormal tagging per vital
use super::vitals::{ClassifiedRecord, NormalizedRecord, Vital, VitalStatus, VitalStatuses};
use serde::Deserialize;

/// Clinical cutoffs shared by the classifier and the chart reference lines.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClinicalThresholds {
    /// Tachycardia cutoff; readings strictly above are abnormal.
    pub bpm_upper: f64,
    /// Hypoxaemia cutoff; readings strictly below are abnormal.
    pub spo2_lower: f64,
    /// Fever cutoff in °C; readings strictly above are abnormal.
    pub temperature_upper: f64,
}

impl Default for ClinicalThresholds {
    fn default() -> Self {
        Self {
            bpm_upper: 100.0,
            spo2_lower: 95.0,
            temperature_upper: 37.5,
        }
    }
}

impl ClinicalThresholds {
    pub fn classify_bpm(&self, bpm: Option<f64>) -> VitalStatus {
        tag(bpm, |v| v > self.bpm_upper)
    }

    pub fn classify_spo2(&self, spo2: Option<f64>) -> VitalStatus {
        tag(spo2, |v| v < self.spo2_lower)
    }

    pub fn classify_temperature(&self, temperature: Option<f64>) -> VitalStatus {
        tag(temperature, |v| v > self.temperature_upper)
    }

    /// Value a chart draws as its threshold line. Heart rate charts have none.
    pub fn reference_line(&self, vital: Vital) -> Option<f64> {
        match vital {
            Vital::HeartRate => None,
            Vital::OxygenSaturation => Some(self.spo2_lower),
            Vital::Temperature => Some(self.temperature_upper),
        }
    }

    pub fn classify(&self, record: NormalizedRecord) -> ClassifiedRecord {
        let statuses = VitalStatuses {
            bpm_status: self.classify_bpm(record.raw.bpm),
            spo2_status: self.classify_spo2(record.raw.spo2),
            temperature_status: self.classify_temperature(record.temperature_resolved),
        };
        ClassifiedRecord { record, statuses }
    }
}

fn tag(value: Option<f64>, is_abnormal: impl Fn(f64) -> bool) -> VitalStatus {
    match value {
        Some(v) if v.is_nan() => VitalStatus::Unknown,
        Some(v) if is_abnormal(v) => VitalStatus::Abnormal,
        Some(_) => VitalStatus::Normal,
        None => VitalStatus::Unknown,
    }
}
