//! Open-Meteo adapter: hourly weather arrays plus optional marine arrays.
//!
//! The weather endpoint is required; a marine failure is logged and leaves
//! `marine` empty.

use reqwest::Client;
use seastate_core::OpenMeteoConfig;
use serde::Deserialize;
use tracing::instrument;

use super::{absorb, fetch_json};
use crate::error::ProviderError;
use crate::types::Coordinate;

pub const PROVIDER: &str = "open-meteo";
const MARINE_PROVIDER: &str = "open-meteo-marine";

const WEATHER_HOURLY: &str = "temperature_2m,windspeed_10m,winddirection_10m";
const MARINE_HOURLY: &str = "wave_height,wave_period,wave_direction";

/// `current_weather` block (km/h, degrees, °C)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenMeteoCurrent {
    pub time: Option<String>,
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
    pub winddirection: Option<f64>,
}

/// Parallel hourly arrays; `time` entries look like `2023-11-14T22:00` (UTC)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenMeteoWeatherHourly {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    /// km/h
    #[serde(default)]
    pub windspeed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub winddirection_10m: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenMeteoWeather {
    pub current_weather: Option<OpenMeteoCurrent>,
    #[serde(default)]
    pub hourly: OpenMeteoWeatherHourly,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenMeteoMarineHourly {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub wave_height: Vec<Option<f64>>,
    #[serde(default)]
    pub wave_period: Vec<Option<f64>>,
    #[serde(default)]
    pub wave_direction: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenMeteoMarine {
    #[serde(default)]
    pub hourly: OpenMeteoMarineHourly,
}

#[derive(Debug, Clone, Default)]
pub struct OpenMeteoResponse {
    pub weather: OpenMeteoWeather,
    pub marine: Option<OpenMeteoMarine>,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    forecast_url: String,
    marine_url: String,
    forecast_days: u32,
    include_marine: bool,
}

impl OpenMeteoClient {
    pub fn new(config: &OpenMeteoConfig, client: Client) -> Self {
        Self {
            client,
            forecast_url: config.forecast_url.clone(),
            marine_url: config.marine_url.clone(),
            forecast_days: config.forecast_days,
            include_marine: config.include_marine,
        }
    }

    /// Fetch the hourly forecast (and marine data when enabled), or `None`
    /// if the weather request fails.
    pub async fn fetch(&self, coordinate: Coordinate) -> Option<OpenMeteoResponse> {
        absorb(PROVIDER, coordinate, self.try_fetch(coordinate).await)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn try_fetch(
        &self,
        coordinate: Coordinate,
    ) -> Result<OpenMeteoResponse, ProviderError> {
        let (weather, marine) = tokio::join!(
            self.fetch_weather(coordinate),
            self.fetch_marine(coordinate)
        );

        let weather = weather?;
        if weather.hourly.time.is_empty() {
            return Err(ProviderError::Empty { provider: PROVIDER });
        }

        tracing::debug!(
            hours = weather.hourly.time.len(),
            marine = marine.is_some(),
            "Fetched Open-Meteo data"
        );

        Ok(OpenMeteoResponse { weather, marine })
    }

    async fn fetch_weather(&self, coordinate: Coordinate) -> Result<OpenMeteoWeather, ProviderError> {
        let request = self.client.get(&self.forecast_url).query(&[
            ("latitude", coordinate.latitude.to_string()),
            ("longitude", coordinate.longitude.to_string()),
            ("hourly", WEATHER_HOURLY.to_string()),
            ("current_weather", "true".to_string()),
            ("forecast_days", self.forecast_days.to_string()),
        ]);
        fetch_json(PROVIDER, request).await
    }

    async fn fetch_marine(&self, coordinate: Coordinate) -> Option<OpenMeteoMarine> {
        if !self.include_marine {
            return None;
        }

        let request = self.client.get(&self.marine_url).query(&[
            ("latitude", coordinate.latitude.to_string()),
            ("longitude", coordinate.longitude.to_string()),
            ("hourly", MARINE_HOURLY.to_string()),
            ("forecast_days", self.forecast_days.to_string()),
        ]);
        absorb(MARINE_PROVIDER, coordinate, fetch_json(MARINE_PROVIDER, request).await)
    }
}
