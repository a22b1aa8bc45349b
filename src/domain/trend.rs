// Series aggregator - chart-ready per-vital series and latest snapshot
use super::classification::ClinicalThresholds;
use super::timestamp::{normalize, NaiveZone};
use super::vitals::{ClassifiedRecord, RawVitalsRecord, Vital, VitalStatus};
use serde::{Deserialize, Serialize};

/// Where records without a usable timestamp go in the chart series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntimedPlacement {
    /// Sorted as if stamped at the epoch, i.e. ahead of everything else.
    #[default]
    Earliest,
    /// Left out of the chart series; still listed in `VitalsTrend::records`.
    Exclude,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrendOptions {
    pub zone: NaiveZone,
    pub thresholds: ClinicalThresholds,
    pub untimed: UntimedPlacement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: String,
    pub time_ms: Option<i64>,
    pub y: Option<f64>,
    pub status: VitalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub vital: Vital,
    pub title: &'static str,
    pub unit: &'static str,
    pub reference_line: Option<f64>,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub value: Option<f64>,
    pub status: VitalStatus,
}

/// Per-vital view of the most recent record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestVitals {
    pub label: String,
    pub bpm: Reading,
    pub spo2: Reading,
    pub temperature: Reading,
    pub is_critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalsTrend {
    pub records: Vec<ClassifiedRecord>,
    pub bpm_series: ChartSeries,
    pub spo2_series: ChartSeries,
    pub temperature_series: ChartSeries,
    pub latest: Option<ClassifiedRecord>,
    pub latest_vitals: Option<LatestVitals>,
    pub unparsed_timestamps: usize,
    pub critical_count: usize,
}

impl VitalsTrend {
    pub fn series(&self, vital: Vital) -> &ChartSeries {
        match vital {
            Vital::HeartRate => &self.bpm_series,
            Vital::OxygenSaturation => &self.spo2_series,
            Vital::Temperature => &self.temperature_series,
        }
    }
}

/// Sort classified records for one device and cut them into chart series.
pub fn aggregate(records: &[ClassifiedRecord], options: &TrendOptions) -> VitalsTrend {
    let mut sorted = records.to_vec();
    // Stable, so records sharing a timestamp keep their arrival order
    sorted.sort_by_key(|r| r.record.sort_key_ms());

    let charted: Vec<&ClassifiedRecord> = sorted
        .iter()
        .filter(|r| {
            options.untimed == UntimedPlacement::Earliest || r.record.parsed_timestamp.is_some()
        })
        .collect();

    let build = |vital: Vital| ChartSeries {
        vital,
        title: vital.title(),
        unit: vital.unit(),
        reference_line: options.thresholds.reference_line(vital),
        points: charted
            .iter()
            .map(|r| ChartPoint {
                x: time_label(r, options.zone),
                time_ms: r.record.parsed_timestamp.map(|t| t.timestamp_millis()),
                y: r.value_of(vital),
                status: r.status_of(vital),
            })
            .collect(),
    };

    let bpm_series = build(Vital::HeartRate);
    let spo2_series = build(Vital::OxygenSaturation);
    let temperature_series = build(Vital::Temperature);

    let latest = sorted.last().cloned();
    let latest_vitals = latest.as_ref().map(|r| LatestVitals {
        label: time_label(r, options.zone),
        bpm: reading(r, Vital::HeartRate),
        spo2: reading(r, Vital::OxygenSaturation),
        temperature: reading(r, Vital::Temperature),
        is_critical: r.record.raw.is_critical,
    });

    let unparsed_timestamps = sorted
        .iter()
        .filter(|r| r.record.parsed_timestamp.is_none())
        .count();
    let critical_count = sorted.iter().filter(|r| r.record.raw.is_critical).count();

    VitalsTrend {
        records: sorted,
        bpm_series,
        spo2_series,
        temperature_series,
        latest,
        latest_vitals,
        unparsed_timestamps,
        critical_count,
    }
}

/// Normalize, classify and aggregate one batch of raw records.
pub fn build_trend(raw: &[RawVitalsRecord], options: &TrendOptions) -> VitalsTrend {
    let classified: Vec<ClassifiedRecord> = raw
        .iter()
        .map(|r| options.thresholds.classify(normalize(r, options.zone)))
        .collect();

    let trend = aggregate(&classified, options);
    tracing::debug!(
        "Built trend from {} records ({} without a usable timestamp)",
        trend.records.len(),
        trend.unparsed_timestamps
    );
    trend
}

fn time_label(record: &ClassifiedRecord, zone: NaiveZone) -> String {
    match record.record.parsed_timestamp {
        Some(t) => zone.label(t),
        None => record.record.raw.timestamp.clone().unwrap_or_default(),
    }
}

fn reading(record: &ClassifiedRecord, vital: Vital) -> Reading {
    Reading {
        value: record.value_of(vital),
        status: record.status_of(vital),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone, Utc};

    fn utc_options() -> TrendOptions {
        TrendOptions {
            zone: NaiveZone::Utc,
            ..TrendOptions::default()
        }
    }

    fn raw(timestamp: &str, bpm: f64) -> RawVitalsRecord {
        let mut record = RawVitalsRecord::new("D1", timestamp);
        record.bpm = Some(bpm);
        record.spo2 = Some(97.0);
        record.temperature = Some(36.8);
        record
    }

    fn assert_non_decreasing(series: &ChartSeries) {
        let keys: Vec<i64> = series.points.iter().map(|p| p.time_ms.unwrap_or(0)).collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]), "{:?}", keys);
    }

    #[test]
    fn test_empty_input() {
        let trend = build_trend(&[], &utc_options());

        assert!(trend.records.is_empty());
        assert!(trend.bpm_series.points.is_empty());
        assert!(trend.spo2_series.points.is_empty());
        assert!(trend.temperature_series.points.is_empty());
        assert_eq!(trend.latest, None);
        assert_eq!(trend.latest_vitals, None);
        assert_eq!(trend.unparsed_timestamps, 0);
    }

    #[test]
    fn test_out_of_order_records_are_sorted() {
        let input = vec![raw("2024-01-02T10:00:00Z", 80.0), raw("2024-01-01T10:00:00Z", 90.0)];

        let trend = build_trend(&input, &utc_options());

        let bpm: Vec<Option<f64>> = trend.bpm_series.points.iter().map(|p| p.y).collect();
        assert_eq!(bpm, vec![Some(90.0), Some(80.0)]);
        assert_eq!(trend.records[0].record.raw, input[1]);
        assert_eq!(trend.latest.as_ref().map(|r| &r.record.raw), Some(&input[0]));
    }

    #[test]
    fn test_series_sorted_across_formats() {
        let input = vec![
            raw("2024-03-05 14:30:00", 1.0),
            raw("04-03-2024 09:00:00", 2.0),
            raw("2024-03-05T08:00:00Z", 3.0),
            raw("2024/03/06 00:00:00.5", 4.0),
            raw("bogus", 5.0),
        ];

        let trend = build_trend(&input, &utc_options());

        for vital in Vital::ALL {
            assert_non_decreasing(trend.series(vital));
        }
        let order: Vec<Option<f64>> = trend.bpm_series.points.iter().map(|p| p.y).collect();
        assert_eq!(order, vec![Some(5.0), Some(2.0), Some(3.0), Some(1.0), Some(4.0)]);

        let latest = trend.latest.as_ref().unwrap();
        for vital in Vital::ALL {
            let last = trend.series(vital).points.last().unwrap();
            assert_eq!(last.y, latest.value_of(vital));
        }
    }

    #[test]
    fn test_empty_timestamp_sorts_first_and_is_retained() {
        let input = vec![raw("2024-03-05 14:30:00", 70.0), raw("", 75.0)];

        let trend = build_trend(&input, &utc_options());

        assert_eq!(trend.records.len(), 2);
        assert_eq!(trend.unparsed_timestamps, 1);
        let first = &trend.bpm_series.points[0];
        assert_eq!(first.y, Some(75.0));
        assert_eq!(first.time_ms, None);
        assert_eq!(first.x, "");
        assert_eq!(trend.latest.as_ref().unwrap().record.raw.bpm, Some(70.0));
    }

    #[test]
    fn test_unparsed_label_falls_back_to_raw_string() {
        let trend = build_trend(&[raw("yesterday-ish", 70.0)], &utc_options());
        assert_eq!(trend.bpm_series.points[0].x, "yesterday-ish");
    }

    #[test]
    fn test_exclude_placement_keeps_audit_records() {
        let options = TrendOptions {
            untimed: UntimedPlacement::Exclude,
            ..utc_options()
        };
        let input = vec![raw("", 60.0), raw("2024-03-05 14:30:00", 70.0)];

        let trend = build_trend(&input, &options);

        assert_eq!(trend.records.len(), 2);
        assert_eq!(trend.bpm_series.points.len(), 1);
        assert_eq!(trend.bpm_series.points[0].y, Some(70.0));
        assert_eq!(trend.unparsed_timestamps, 1);
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        let input = vec![
            raw("2024-03-05 14:30:00", 1.0),
            raw("2024-03-05T14:30:00Z", 2.0),
            raw("2024-03-05 14:30:00", 3.0),
        ];

        let trend = build_trend(&input, &utc_options());

        let order: Vec<Option<f64>> = trend.bpm_series.points.iter().map(|p| p.y).collect();
        assert_eq!(order, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_missing_temperature_is_unknown_point() {
        let mut record = raw("2024-03-05 14:30:00", 70.0);
        record.temperature = None;

        let trend = build_trend(&[record], &utc_options());

        let point = &trend.temperature_series.points[0];
        assert_eq!(point.y, None);
        assert_eq!(point.status, VitalStatus::Unknown);
        assert_eq!(
            trend.latest_vitals.as_ref().unwrap().temperature.status,
            VitalStatus::Unknown
        );
    }

    #[test]
    fn test_reference_lines_and_counts() {
        let mut alarm = raw("2024-03-05 14:30:00", 70.0);
        alarm.is_critical = true;

        let trend = build_trend(&[alarm, raw("2024-03-05 14:31:00", 72.0)], &utc_options());

        assert_eq!(trend.spo2_series.reference_line, Some(95.0));
        assert_eq!(trend.temperature_series.reference_line, Some(37.5));
        assert_eq!(trend.bpm_series.reference_line, None);
        assert_eq!(trend.critical_count, 1);
        assert!(!trend.latest_vitals.as_ref().unwrap().is_critical);
    }

    #[test]
    fn test_fever_scenario_local_time() {
        let mut record = RawVitalsRecord::new("D1", "2024-03-05 14:30:00");
        record.bpm = Some(110.0);
        record.spo2 = Some(92.0);
        record.temperature = Some(38.1);

        let trend = build_trend(&[record], &TrendOptions::default());

        let latest = trend.latest.unwrap();
        let expected = Local.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        assert_eq!(latest.record.parsed_timestamp, Some(expected.with_timezone(&Utc)));
        assert_eq!(latest.statuses.bpm_status, VitalStatus::Abnormal);
        assert_eq!(latest.statuses.spo2_status, VitalStatus::Abnormal);
        assert_eq!(latest.statuses.temperature_status, VitalStatus::Abnormal);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let input = vec![
            raw("25-12-2023 08:05:09", 101.0),
            raw("", 99.0),
            raw("2024-01-01T00:00:00Z", 60.0),
        ];

        let first = build_trend(&input, &TrendOptions::default());
        let second = build_trend(&input, &TrendOptions::default());

        assert_eq!(first, second);
    }
}
