// Repository trait for device vitals access
use crate::domain::vitals::RawVitalsRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Failures of the upstream telemetry fetch. The message is shown to users verbatim.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Device id must not be empty")]
    InvalidDevice,

    #[error("Telemetry request failed: {0}")]
    Transport(String),

    #[error("Telemetry service responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse telemetry response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait VitalsRepository: Send + Sync {
    /// Fetch every raw vitals record reported by a device
    async fn fetch_vitals(&self, device_id: &str) -> Result<Vec<RawVitalsRecord>, FetchError>;
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory repository counting how often it is hit.
    #[derive(Default)]
    pub struct StaticRepository {
        pub devices: HashMap<String, Vec<RawVitalsRecord>>,
        pub fail_with: Option<String>,
        pub calls: AtomicUsize,
    }

    impl StaticRepository {
        pub fn with_device(device_id: &str, records: Vec<RawVitalsRecord>) -> Self {
            let mut devices = HashMap::new();
            devices.insert(device_id.to_string(), records);
            Self {
                devices,
                ..Self::default()
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VitalsRepository for StaticRepository {
        async fn fetch_vitals(&self, device_id: &str) -> Result<Vec<RawVitalsRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.fail_with {
                return Err(FetchError::Transport(message.clone()));
            }
            Ok(self.devices.get(device_id).cloned().unwrap_or_default())
        }
    }
}
