//! Maps combined hourly records onto the canonical [`ForecastPoint`] shape.

use chrono::{DateTime, Duration, Utc};

use crate::types::{ForecastPoint, HourlyRecord};

/// The single default policy for values a provider did not supply.
///
/// Used by the combiners for their wave placeholders, by the Open-Meteo
/// formatter and by the normalizer, so a missing value resolves the same way
/// whichever path produced the record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDataPolicy;

impl NoDataPolicy {
    pub const WIND_SPEED_MS: f64 = 0.0;
    pub const WIND_DEG: f64 = 0.0;

    /// Gentle daily variation: 1.5 m rising by 0.1 m per hour of the day.
    pub fn wave_height_m(index: usize) -> f64 {
        1.5 + (index % 24) as f64 * 0.1
    }

    /// 6.0 s rising by 0.5 s over a 12 hour cycle.
    pub fn wave_period_s(index: usize) -> f64 {
        6.0 + (index % 12) as f64 * 0.5
    }
}

/// Normalize up to `max_points` records, preserving order.
///
/// Records without a timestamp are placed at `now + i hours`.
pub fn normalize(records: &[HourlyRecord], now: DateTime<Utc>, max_points: usize) -> Vec<ForecastPoint> {
    records
        .iter()
        .take(max_points)
        .enumerate()
        .map(|(i, record)| normalize_record(i, record, now))
        .collect()
}

fn normalize_record(index: usize, record: &HourlyRecord, now: DateTime<Utc>) -> ForecastPoint {
    let timestamp = record
        .time
        .unwrap_or_else(|| now + Duration::hours(index as i64));

    let wind_speed_ms = record
        .wind_speed_ms
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0))
        .unwrap_or(NoDataPolicy::WIND_SPEED_MS);

    let wind_deg = record
        .wind_deg
        .filter(|v| v.is_finite())
        .map(wrap_degrees)
        .unwrap_or(NoDataPolicy::WIND_DEG);

    let wave_height_m = record
        .wave_height_m
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or_else(|| NoDataPolicy::wave_height_m(index));

    let wave_period_s = record
        .wave_period_s
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or_else(|| NoDataPolicy::wave_period_s(index));

    ForecastPoint {
        timestamp,
        wind_speed_ms,
        wind_deg,
        wave_height_m,
        wave_period_s,
    }
}

/// Fold any finite bearing into [0, 360).
pub(crate) fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
