//! Merges a weather source with Stormglass wave data into a
//! [`CombinedForecast`].
//!
//! Wave data only ever flows from Stormglass into the weather series; a
//! Stormglass hour without a usable value for a metric leaves the existing
//! estimate untouched.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use seastate_core::{Config, WaveAlignment};

use crate::format::format_open_meteo;
use crate::normalize::NoDataPolicy;
use crate::provider::open_meteo::OpenMeteoResponse;
use crate::provider::openweather::{OpenWeatherEntry, OpenWeatherResponse};
use crate::provider::stormglass::{StormglassHour, StormglassResponse};
use crate::synthetic;
use crate::types::{CombinedForecast, Coordinate, ForecastSource, HourlyRecord};

/// Settings shared by both combiners.
#[derive(Debug, Clone)]
pub struct MergeSettings {
    pub max_points: usize,
    pub alignment: WaveAlignment,
    pub source_priority: Vec<String>,
}

impl MergeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_points: config.pipeline.max_points,
            alignment: config.pipeline.wave_alignment,
            source_priority: config.stormglass.source_priority.clone(),
        }
    }
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// OpenWeather current conditions followed by its forecast entries, with
/// Stormglass waves applied when available.
pub fn combine_openweather(
    weather: &OpenWeatherResponse,
    waves: Option<&StormglassResponse>,
    coordinate: Coordinate,
    settings: &MergeSettings,
) -> CombinedForecast {
    let mut hourly: Vec<HourlyRecord> = std::iter::once(&weather.current)
        .chain(weather.forecast.list.iter())
        .take(settings.max_points)
        .enumerate()
        .map(|(i, entry)| openweather_record(i, entry))
        .collect();

    let overwritten = waves
        .map(|w| apply_waves(&mut hourly, w, settings))
        .unwrap_or(0);

    let source = if overwritten > 0 {
        ForecastSource::OpenWeatherStormglass
    } else {
        ForecastSource::OpenWeather
    };

    CombinedForecast {
        coordinate,
        hourly,
        source,
    }
}

fn openweather_record(index: usize, entry: &OpenWeatherEntry) -> HourlyRecord {
    HourlyRecord {
        time: entry.time(),
        wind_speed_ms: entry.wind_speed(),
        wind_deg: entry.wind_deg(),
        temperature_c: entry.temperature(),
        wave_height_m: Some(NoDataPolicy::wave_height_m(index)),
        wave_period_s: Some(NoDataPolicy::wave_period_s(index)),
    }
}

/// Open-Meteo hourly data, formatted and then overlaid with Stormglass waves.
///
/// If the Open-Meteo payload cannot be formatted the result is the synthetic
/// series for the coordinate, without any wave overlay.
pub fn combine_open_meteo(
    weather: &OpenMeteoResponse,
    waves: Option<&StormglassResponse>,
    coordinate: Coordinate,
    now: DateTime<Utc>,
    settings: &MergeSettings,
) -> CombinedForecast {
    let mut combined = match format_open_meteo(weather, coordinate, settings.max_points) {
        Ok(combined) => combined,
        Err(e) => {
            tracing::warn!(
                lat = coordinate.latitude,
                lon = coordinate.longitude,
                error = %e,
                "Open-Meteo data could not be formatted, using synthetic series"
            );
            return synthetic_combined(coordinate, now, settings.max_points);
        }
    };

    let overwritten = waves
        .map(|w| apply_waves(&mut combined.hourly, w, settings))
        .unwrap_or(0);

    if overwritten > 0 {
        combined.source = ForecastSource::OpenMeteoStormglass;
    }

    combined
}

fn synthetic_combined(coordinate: Coordinate, now: DateTime<Utc>, max_points: usize) -> CombinedForecast {
    let hourly = synthetic::generate(coordinate, now)
        .iter()
        .take(max_points)
        .map(HourlyRecord::from)
        .collect();

    CombinedForecast {
        coordinate,
        hourly,
        source: ForecastSource::Synthetic,
    }
}

/// Overlay Stormglass waves onto `hourly`. Returns how many records received
/// at least one value.
pub fn apply_waves(
    hourly: &mut [HourlyRecord],
    waves: &StormglassResponse,
    settings: &MergeSettings,
) -> usize {
    let by_hour: HashMap<i64, &StormglassHour> = match settings.alignment {
        WaveAlignment::Timestamp => waves
            .hours
            .iter()
            .filter_map(|h| h.time.map(|t| (hour_bucket(t), h)))
            .collect(),
        WaveAlignment::Positional => HashMap::new(),
    };

    let mut overwritten = 0;
    for (i, record) in hourly.iter_mut().enumerate() {
        let hour = match settings.alignment {
            WaveAlignment::Timestamp => record
                .time
                .and_then(|t| by_hour.get(&hour_bucket(t)).copied())
                .or_else(|| record.time.is_none().then(|| waves.hours.get(i)).flatten()),
            WaveAlignment::Positional => waves.hours.get(i),
        };

        let Some(hour) = hour else { continue };

        let mut touched = false;
        if let Some(height) = hour.wave_height_m(&settings.source_priority) {
            record.wave_height_m = Some(height);
            touched = true;
        }
        if let Some(period) = hour.wave_period_s(&settings.source_priority) {
            record.wave_period_s = Some(period);
            touched = true;
        }
        if touched {
            overwritten += 1;
        }
    }

    tracing::debug!(overwritten, total = hourly.len(), "Applied Stormglass waves");
    overwritten
}

fn hour_bucket(time: DateTime<Utc>) -> i64 {
    time.timestamp().div_euclid(3600)
}
