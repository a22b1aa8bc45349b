// HTTP request handlers
use crate::domain::trend::VitalsTrend;
use crate::domain::vitals::RawVitalsRecord;
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub refresh: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Vitals trend for one device, fetched from the telemetry service
pub async fn device_vitals(
    Path(device_id): Path<String>,
    Query(query): Query<RefreshQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<VitalsTrend>, ApiError> {
    let trend = state
        .vitals_service
        .device_trend(&device_id, query.refresh)
        .await?;
    Ok(Json(trend))
}

/// Vitals trend for records posted by the caller
pub async fn trend_from_records(
    State(state): State<Arc<AppState>>,
    Json(records): Json<Vec<RawVitalsRecord>>,
) -> Json<VitalsTrend> {
    Json(state.vitals_service.trend_for(&records))
}
