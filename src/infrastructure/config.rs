use crate::domain::classification::ClinicalThresholds;
use crate::domain::timestamp::NaiveZone;
use crate::domain::trend::{TrendOptions, UntimedPlacement};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const ENV_PREFIX: &str = "VITALS";

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    pub base_url: String,
    #[serde(default = "default_query_path")]
    pub query_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VitalsConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub thresholds: ClinicalThresholds,
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PipelineSettings {
    #[serde(default)]
    pub naive_timezone: NaiveZone,
    #[serde(default)]
    pub untimed_placement: UntimedPlacement,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 30 }
    }
}

impl VitalsConfig {
    pub fn trend_options(&self) -> TrendOptions {
        TrendOptions {
            zone: self.pipeline.naive_timezone,
            thresholds: self.thresholds,
            untimed: self.pipeline.untimed_placement,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

fn default_query_path() -> String {
    "/devices/${device_id}/vitals".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

pub fn load_telemetry_config() -> anyhow::Result<TelemetryConfig> {
    load(config::File::with_name("config/telemetry"))
}

pub fn load_vitals_config() -> anyhow::Result<VitalsConfig> {
    load(config::File::with_name("config/vitals").required(false))
}

/// Layer one file source under `VITALS__SECTION__KEY` environment overrides.
fn load<T, S>(source: S) -> anyhow::Result<T>
where
    T: DeserializeOwned,
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(source)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace `${name}` placeholders in a template string
pub fn prepare_template(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}
