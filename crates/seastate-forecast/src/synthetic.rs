//! Deterministic fallback series.
//!
//! Seeded from the coordinate so the same point always produces the same
//! wind/wave pattern (for a given start instant). Each call owns its own
//! generator; nothing outside the call observes the seed.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{Coordinate, Forecast, ForecastPoint, ForecastSource};

/// Number of hourly points emitted (10 days).
pub const SYNTHETIC_POINTS: usize = 240;

/// `floor((lat + lon) * 1000) mod 1000`, always in `0..1000`.
pub fn seed_for(coordinate: Coordinate) -> u64 {
    let scaled = ((coordinate.latitude + coordinate.longitude) * 1000.0).floor();
    // `as` saturates for out-of-range floats and maps NaN to 0
    (scaled as i64).rem_euclid(1000) as u64
}

/// Generate exactly [`SYNTHETIC_POINTS`] hourly points starting at `now`.
pub fn generate(coordinate: Coordinate, now: DateTime<Utc>) -> Vec<ForecastPoint> {
    let mut rng = StdRng::seed_from_u64(seed_for(coordinate));

    (0..SYNTHETIC_POINTS)
        .map(|i| {
            let wind_speed_ms = rng.gen_range(2.0..=20.0);
            let wind_deg = f64::from(rng.gen_range(0u32..360));
            let wave_height_m = rng.gen_range(0.5..=4.0);
            let wave_period_s = rng.gen_range(5.0..=12.0);

            ForecastPoint {
                timestamp: now + Duration::hours(i as i64),
                wind_speed_ms,
                wind_deg,
                wave_height_m,
                wave_period_s,
            }
        })
        .collect()
}

/// Synthetic series wrapped as a [`Forecast`], truncated to `max_points`.
pub fn forecast(coordinate: Coordinate, now: DateTime<Utc>, max_points: usize) -> Forecast {
    let mut points = generate(coordinate, now);
    points.truncate(max_points.max(1));

    Forecast {
        coordinate,
        source: ForecastSource::Synthetic,
        generated_at: now,
        points,
    }
}
