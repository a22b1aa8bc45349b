// Telemetry normalizer - timestamp parsing and field aliasing
use super::vitals::{NormalizedRecord, RawVitalsRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use serde::Deserialize;

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Time zone applied to timestamps that carry no offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NaiveZone {
    #[default]
    Local,
    Utc,
}

impl NaiveZone {
    /// Pin a wall-clock reading to an instant.
    ///
    /// Ambiguous local times take the earlier instant; times inside a DST gap
    /// are pushed forward by one hour.
    pub fn resolve(self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            NaiveZone::Utc => Some(naive.and_utc()),
            NaiveZone::Local => chrono::Local
                .from_local_datetime(&naive)
                .earliest()
                .or_else(|| {
                    let shifted = naive.checked_add_signed(TimeDelta::hours(1))?;
                    chrono::Local.from_local_datetime(&shifted).earliest()
                })
                .map(|t| t.with_timezone(&Utc)),
        }
    }

    /// Display label for a chart axis.
    pub fn label(self, instant: DateTime<Utc>) -> String {
        const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
        match self {
            NaiveZone::Utc => instant.format(FORMAT).to_string(),
            NaiveZone::Local => instant.with_timezone(&chrono::Local).format(FORMAT).to_string(),
        }
    }
}

/// Parse a device timestamp, returning `None` when no strategy succeeds.
///
/// Strategies, first success wins:
/// 1. standard construction (RFC 3339, RFC 2822, ISO date-time, ISO date)
/// 2. the same after turning `/` into `-` and the first space into `T`
/// 3. manual `date time` decomposition, year position guessed by magnitude
pub fn parse_timestamp(raw: &str, zone: NaiveZone) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(parsed) = parse_standard(trimmed, zone) {
        return Some(parsed);
    }

    let dashed = trimmed.replace('/', "-");
    let iso_like = dashed.replacen(' ', "T", 1);
    if let Some(parsed) = parse_standard(&iso_like, zone) {
        return Some(parsed);
    }

    parse_decomposed(&dashed, zone)
}

fn parse_standard(s: &str, zone: NaiveZone) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_rfc2822(s) {
        return Some(t.with_timezone(&Utc));
    }

    // chrono's %Y happily reads "05" as year 5; require a four-digit year
    if !has_iso_date_prefix(s) {
        return None;
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return zone.resolve(naive);
        }
    }

    // Date-only ISO strings are UTC midnight regardless of the naive zone
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn has_iso_date_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}

fn parse_decomposed(s: &str, zone: NaiveZone) -> Option<DateTime<Utc>> {
    let (date_part, time_part) = s.split_once(' ')?;

    let components = date_part
        .split('-')
        .map(|p| p.trim().parse::<u32>().ok())
        .collect::<Option<Vec<u32>>>()?;
    let &[first, second, third] = components.as_slice() else {
        return None;
    };

    // Only a first component above 31 can be a year; anything else is read as DD-MM-YYYY
    let (year, month, day) = if first > 31 {
        (first, second, third)
    } else {
        (third, second, first)
    };

    let mut clock = time_part.trim().split(':');
    let hours = clock.next()?.trim().parse::<u32>().ok()?;
    let minutes = clock.next()?.trim().parse::<u32>().ok()?;
    let seconds = clock.next()?.trim().parse::<f64>().ok()?;
    if clock.next().is_some() || !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    let naive = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?
        .and_hms_opt(hours, minutes, seconds.floor() as u32)?;
    zone.resolve(naive)
}

/// Normalize one raw record. Never fails: an unreadable timestamp becomes `None`
/// and the original string stays on the record for display.
pub fn normalize(raw: &RawVitalsRecord, zone: NaiveZone) -> NormalizedRecord {
    let parsed_timestamp = raw
        .timestamp
        .as_deref()
        .and_then(|ts| parse_timestamp(ts, zone));

    NormalizedRecord {
        raw: raw.clone(),
        parsed_timestamp,
        temperature_resolved: raw.resolved_temperature(),
    }
}
