//! Formats Open-Meteo's parallel hourly arrays into hourly records.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::PipelineError;
use crate::normalize::NoDataPolicy;
use crate::provider::open_meteo::OpenMeteoResponse;
use crate::types::{CombinedForecast, Coordinate, ForecastSource, HourlyRecord};

const KMH_PER_MS: f64 = 3.6;

/// Open-Meteo reports wind speed in km/h.
pub fn kmh_to_ms(kmh: f64) -> f64 {
    kmh / KMH_PER_MS
}

/// Build hourly records from the Open-Meteo arrays, at most `max_points`.
///
/// Wave values come from the marine arrays when present; gaps are filled by
/// [`NoDataPolicy`]. Fails only if a timestamp cannot be parsed.
pub fn format_open_meteo(
    response: &OpenMeteoResponse,
    coordinate: Coordinate,
    max_points: usize,
) -> Result<CombinedForecast, PipelineError> {
    let hourly = &response.weather.hourly;
    let marine = response.marine.as_ref().map(|m| &m.hourly);

    let records = hourly
        .time
        .iter()
        .take(max_points)
        .enumerate()
        .map(|(i, time)| -> Result<HourlyRecord, PipelineError> {
            let time = parse_time(time)?;

            let wave_height_m = marine
                .and_then(|m| value_at(&m.wave_height, i))
                .unwrap_or_else(|| NoDataPolicy::wave_height_m(i));
            let wave_period_s = marine
                .and_then(|m| value_at(&m.wave_period, i))
                .unwrap_or_else(|| NoDataPolicy::wave_period_s(i));

            Ok(HourlyRecord {
                time: Some(time),
                wind_speed_ms: value_at(&hourly.windspeed_10m, i).map(kmh_to_ms),
                wind_deg: value_at(&hourly.winddirection_10m, i),
                temperature_c: value_at(&hourly.temperature_2m, i),
                wave_height_m: Some(wave_height_m),
                wave_period_s: Some(wave_period_s),
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    let source = if response.marine.is_some() {
        ForecastSource::OpenMeteoMarine
    } else {
        ForecastSource::OpenMeteo
    };

    Ok(CombinedForecast {
        coordinate,
        hourly: records,
        source,
    })
}

fn value_at(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten()
}

/// Accepts `2023-11-14T22:00`, `2023-11-14T22:00:00` or a full RFC 3339
/// string; offset-less times are UTC.
pub(crate) fn parse_time(value: &str) -> Result<DateTime<Utc>, PipelineError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|e| PipelineError::Format(format!("bad time {:?}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::open_meteo::{
        OpenMeteoMarine, OpenMeteoMarineHourly, OpenMeteoWeather, OpenMeteoWeatherHourly,
    };

    fn coord() -> Coordinate {
        Coordinate::new(19.076, 72.8777)
    }

    fn response(times: &[&str], wind_kmh: Vec<Option<f64>>, marine: Option<OpenMeteoMarine>) -> OpenMeteoResponse {
        OpenMeteoResponse {
            weather: OpenMeteoWeather {
                current_weather: None,
                hourly: OpenMeteoWeatherHourly {
                    time: times.iter().map(|s| s.to_string()).collect(),
                    temperature_2m: vec![Some(27.0); times.len()],
                    windspeed_10m: wind_kmh,
                    winddirection_10m: vec![Some(180.0); times.len()],
                },
            },
            marine,
        }
    }

    #[test]
    fn test_kmh_conversion() {
        assert_eq!(kmh_to_ms(18.0), 5.0);
        assert_eq!(kmh_to_ms(0.0), 0.0);
    }

    #[test]
    fn test_wind_converted_to_ms() {
        let r = response(&["2023-11-14T22:00"], vec![Some(18.0)], None);
        let combined = format_open_meteo(&r, coord(), 240).unwrap();
        assert_eq!(combined.hourly[0].wind_speed_ms, Some(5.0));
        assert_eq!(combined.hourly[0].wind_deg, Some(180.0));
        assert_eq!(combined.hourly[0].temperature_c, Some(27.0));
        assert_eq!(
            combined.hourly[0].time.map(|t| t.timestamp()),
            Some(1_699_999_200)
        );
        assert_eq!(combined.source, ForecastSource::OpenMeteo);
    }

    #[test]
    fn test_missing_waves_use_policy() {
        let times = ["2023-11-14T22:00", "2023-11-14T23:00", "2023-11-15T00:00"];
        let r = response(&times, vec![None, Some(3.6)], None);
        let combined = format_open_meteo(&r, coord(), 240).unwrap();

        assert_eq!(combined.hourly.len(), 3);
        assert_eq!(combined.hourly[0].wind_speed_ms, None);
        assert_eq!(combined.hourly[1].wind_speed_ms, Some(1.0));
        assert_eq!(combined.hourly[2].wind_speed_ms, None);
        for (i, h) in combined.hourly.iter().enumerate() {
            assert_eq!(h.wave_height_m, Some(NoDataPolicy::wave_height_m(i)));
            assert_eq!(h.wave_period_s, Some(NoDataPolicy::wave_period_s(i)));
        }
    }

    #[test]
    fn test_marine_values_used_and_labelled() {
        let marine = OpenMeteoMarine {
            hourly: OpenMeteoMarineHourly {
                time: vec!["2023-11-14T22:00".into(), "2023-11-14T23:00".into()],
                wave_height: vec![Some(0.8), None],
                wave_period: vec![Some(9.5)],
                wave_direction: vec![],
            },
        };
        let r = response(
            &["2023-11-14T22:00", "2023-11-14T23:00"],
            vec![Some(10.0), Some(10.0)],
            Some(marine),
        );
        let combined = format_open_meteo(&r, coord(), 240).unwrap();

        assert_eq!(combined.source, ForecastSource::OpenMeteoMarine);
        assert_eq!(combined.hourly[0].wave_height_m, Some(0.8));
        assert_eq!(combined.hourly[0].wave_period_s, Some(9.5));
        assert_eq!(combined.hourly[1].wave_height_m, Some(NoDataPolicy::wave_height_m(1)));
        assert_eq!(combined.hourly[1].wave_period_s, Some(NoDataPolicy::wave_period_s(1)));
    }

    #[test]
    fn test_capped_at_max_points() {
        let times: Vec<String> = (0..300)
            .map(|h| format!("2023-11-{:02}T{:02}:00", 1 + h / 24, h % 24))
            .collect();
        let refs: Vec<&str> = times.iter().map(String::as_str).collect();
        let r = response(&refs, vec![], None);
        assert_eq!(format_open_meteo(&r, coord(), 240).unwrap().hourly.len(), 240);
    }

    #[test]
    fn test_bad_time_is_error() {
        let r = response(&["yesterday"], vec![Some(1.0)], None);
        assert!(matches!(
            format_open_meteo(&r, coord(), 240),
            Err(PipelineError::Format(_))
        ));
    }

    #[test]
    fn test_parse_time_formats() {
        let expected = 1_699_999_200;
        assert_eq!(parse_time("2023-11-14T22:00").unwrap().timestamp(), expected);
        assert_eq!(parse_time("2023-11-14T22:00:00").unwrap().timestamp(), expected);
        assert_eq!(parse_time("2023-11-14T22:00:00Z").unwrap().timestamp(), expected);
        assert_eq!(parse_time("2023-11-15T00:00:00+02:00").unwrap().timestamp(), expected);
    }
}
