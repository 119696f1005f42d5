use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic coordinate in decimal degrees.
///
/// Used verbatim as the cache key and as the synthetic seed input; no rounding
/// is applied anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Exact-match cache key built from the raw bit patterns.
    pub fn cache_key(&self) -> CoordinateKey {
        CoordinateKey {
            lat_bits: self.latitude.to_bits(),
            lon_bits: self.longitude.to_bits(),
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Hashable form of a [`Coordinate`]. Two coordinates differing by
/// floating-point noise produce different keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    lat_bits: u64,
    lon_bits: u64,
}

/// One hour of canonical marine forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    /// Wind speed in m/s, never negative
    pub wind_speed_ms: f64,
    /// Wind direction in degrees, in [0, 360)
    pub wind_deg: f64,
    /// Significant wave height (Hs) in metres, never negative
    pub wave_height_m: f64,
    /// Peak wave period (Tp) in seconds, always positive
    pub wave_period_s: f64,
}

/// Provenance label for a forecast series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastSource {
    #[serde(rename = "OpenWeather")]
    OpenWeather,
    #[serde(rename = "OpenWeather + Stormglass")]
    OpenWeatherStormglass,
    #[serde(rename = "Open-Meteo")]
    OpenMeteo,
    #[serde(rename = "Open-Meteo Marine")]
    OpenMeteoMarine,
    #[serde(rename = "Open-Meteo + Stormglass")]
    OpenMeteoStormglass,
    #[serde(rename = "Synthetic")]
    Synthetic,
}

impl ForecastSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenWeather => "OpenWeather",
            Self::OpenWeatherStormglass => "OpenWeather + Stormglass",
            Self::OpenMeteo => "Open-Meteo",
            Self::OpenMeteoMarine => "Open-Meteo Marine",
            Self::OpenMeteoStormglass => "Open-Meteo + Stormglass",
            Self::Synthetic => "Synthetic",
        }
    }

    /// True when wave fields came from Stormglass.
    pub fn has_stormglass_waves(&self) -> bool {
        matches!(
            self,
            Self::OpenWeatherStormglass | Self::OpenMeteoStormglass
        )
    }
}

impl std::fmt::Display for ForecastSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of the forecast pipeline for one coordinate.
///
/// Never empty and never longer than 240 points. A synthetic series is
/// flagged by its `source`; callers that need to tell degraded output apart
/// from real data should check [`Forecast::is_synthetic`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub coordinate: Coordinate,
    pub source: ForecastSource,
    pub generated_at: DateTime<Utc>,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn is_synthetic(&self) -> bool {
        self.source == ForecastSource::Synthetic
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Provider-neutral hour produced by the combiners and consumed by the
/// normalizer. Absent values are resolved by the normalizer's no-data policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlyRecord {
    pub time: Option<DateTime<Utc>>,
    pub wind_speed_ms: Option<f64>,
    pub wind_deg: Option<f64>,
    pub temperature_c: Option<f64>,
    pub wave_height_m: Option<f64>,
    pub wave_period_s: Option<f64>,
}

impl From<&ForecastPoint> for HourlyRecord {
    fn from(point: &ForecastPoint) -> Self {
        Self {
            time: Some(point.timestamp),
            wind_speed_ms: Some(point.wind_speed_ms),
            wind_deg: Some(point.wind_deg),
            temperature_c: None,
            wave_height_m: Some(point.wave_height_m),
            wave_period_s: Some(point.wave_period_s),
        }
    }
}

/// Intermediate shape: one weather source merged with optional wave data.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedForecast {
    pub coordinate: Coordinate,
    pub hourly: Vec<HourlyRecord>,
    pub source: ForecastSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_exact() {
        let a = Coordinate::new(19.076, 72.8777);
        let b = Coordinate::new(19.076, 72.8777);
        let c = Coordinate::new(19.076 + 1e-12, 72.8777);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_source_labels() {
        assert_eq!(ForecastSource::OpenWeatherStormglass.label(), "OpenWeather + Stormglass");
        assert_eq!(ForecastSource::OpenMeteoMarine.to_string(), "Open-Meteo Marine");
        assert!(ForecastSource::OpenMeteoStormglass.has_stormglass_waves());
        assert!(!ForecastSource::OpenMeteoMarine.has_stormglass_waves());
    }

    #[test]
    fn test_source_serializes_as_label() {
        let json = serde_json::to_string(&ForecastSource::OpenMeteoStormglass).unwrap();
        assert_eq!(json, r#""Open-Meteo + Stormglass""#);
    }

    #[test]
    fn test_forecast_point_serialization() {
        let point = ForecastPoint {
            timestamp: DateTime::from_timestamp(1_699_999_200, 0).unwrap(),
            wind_speed_ms: 5.0,
            wind_deg: 180.0,
            wave_height_m: 1.2,
            wave_period_s: 8.0,
        };
        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("\"wind_speed_ms\":5.0"));
        assert!(json.contains("2023-11-14T22:00:00Z"));
    }
}
