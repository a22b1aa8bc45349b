// Vitals service - Use case for building a device's vitals trend
use crate::application::request_cache::RequestCache;
use crate::application::vitals_repository::{FetchError, VitalsRepository};
use crate::domain::trend::{build_trend, TrendOptions, VitalsTrend};
use crate::domain::vitals::RawVitalsRecord;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct VitalsService {
    repository: Arc<dyn VitalsRepository>,
    cache: Arc<RequestCache<Arc<Vec<RawVitalsRecord>>>>,
    options: TrendOptions,
}

impl VitalsService {
    pub fn new(repository: Arc<dyn VitalsRepository>, options: TrendOptions, cache_ttl: Duration) -> Self {
        Self {
            repository,
            cache: Arc::new(RequestCache::new(cache_ttl)),
            options,
        }
    }

    /// Trend for one device. Raw records may come from the cache; the trend
    /// itself is always rebuilt from them.
    pub async fn device_trend(&self, device_id: &str, refresh: bool) -> Result<VitalsTrend, FetchError> {
        let records = self.raw_records(device_id, refresh).await?;
        let trend = build_trend(&records, &self.options);

        if trend.unparsed_timestamps > 0 {
            tracing::warn!(
                "Device {} returned {} records with unreadable timestamps",
                device_id,
                trend.unparsed_timestamps
            );
        }

        Ok(trend)
    }

    /// Trend for records the caller already holds.
    pub fn trend_for(&self, records: &[RawVitalsRecord]) -> VitalsTrend {
        build_trend(records, &self.options)
    }

    async fn raw_records(
        &self,
        device_id: &str,
        refresh: bool,
    ) -> Result<Arc<Vec<RawVitalsRecord>>, FetchError> {
        let device_id = device_id.trim();
        if device_id.is_empty() {
            return Err(FetchError::InvalidDevice);
        }

        if !refresh {
            if let Some(records) = self.cache.get(device_id) {
                tracing::debug!("Cache hit for device {}", device_id);
                return Ok(records);
            }
        }

        tracing::debug!("Fetching vitals for device {} (refresh={})", device_id, refresh);
        let ticket = self.cache.begin(device_id);
        let records = match self.repository.fetch_vitals(device_id).await {
            Ok(records) => Arc::new(records),
            Err(e) => {
                tracing::warn!("Error fetching vitals for {}: {}", device_id, e);
                // Never serve records older than a failed fetch
                self.cache.fail(ticket);
                return Err(e);
            }
        };

        if !self.cache.complete(ticket, records.clone()) {
            tracing::debug!("Discarding superseded response for device {}", device_id);
        }

        Ok(records)
    }
}
