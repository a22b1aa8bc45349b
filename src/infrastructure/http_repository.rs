// HTTP telemetry service repository implementation
use crate::application::vitals_repository::{FetchError, VitalsRepository};
use crate::domain::vitals::RawVitalsRecord;
use crate::infrastructure::config::{prepare_template, TelemetrySettings};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpVitalsRepository {
    base_url: String,
    query_path: String,
    token: Option<String>,
    client: reqwest::Client,
}

/// Envelope form of the response; devices may also send the bare array
#[derive(Debug, Deserialize)]
struct TelemetryEnvelope {
    data: Vec<RawVitalsRecord>,
}

impl HttpVitalsRepository {
    pub fn new(settings: &TelemetrySettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build telemetry HTTP client")?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            query_path: settings.query_path.clone(),
            token: settings.token.clone().filter(|t| !t.is_empty()),
            client,
        })
    }

    fn build_url(&self, device_id: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("device_id".to_string(), urlencoding::encode(device_id).into_owned());
        let path = prepare_template(&self.query_path, &vars);
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Decode either response form, keeping serde's own error (with position) for the user.
fn decode_records(body: &str) -> Result<Vec<RawVitalsRecord>, FetchError> {
    let decoded = if body.trim_start().starts_with('{') {
        serde_json::from_str::<TelemetryEnvelope>(body).map(|envelope| envelope.data)
    } else {
        serde_json::from_str::<Vec<RawVitalsRecord>>(body)
    };
    decoded.map_err(|e| FetchError::Decode(e.to_string()))
}

#[async_trait]
impl VitalsRepository for HttpVitalsRepository {
    async fn fetch_vitals(&self, device_id: &str) -> Result<Vec<RawVitalsRecord>, FetchError> {
        let url = self.build_url(device_id);
        tracing::debug!("Requesting vitals: {}", url);

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response.text().await?;
        let records = decode_records(&body)?;
        tracing::debug!("Received {} vitals records for device {}", records.len(), device_id);
        Ok(records)
    }
}
