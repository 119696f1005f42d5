//! OpenWeather adapter: current conditions plus the multi-day forecast.

use chrono::{DateTime, Utc};
use reqwest::Client;
use seastate_core::OpenWeatherConfig;
use serde::Deserialize;
use tracing::instrument;

use super::{absorb, fetch_json, trim_base};
use crate::error::ProviderError;
use crate::types::Coordinate;

pub const PROVIDER: &str = "openweather";

/// Wind block shared by current and forecast entries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenWeatherWind {
    /// m/s with `units=metric`
    pub speed: Option<f64>,
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenWeatherMain {
    /// °C with `units=metric`
    pub temp: Option<f64>,
}

/// One observation or forecast step
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenWeatherEntry {
    /// Unix seconds
    pub dt: Option<i64>,
    pub wind: Option<OpenWeatherWind>,
    pub main: Option<OpenWeatherMain>,
}

impl OpenWeatherEntry {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.dt.and_then(|dt| DateTime::from_timestamp(dt, 0))
    }

    pub fn wind_speed(&self) -> Option<f64> {
        self.wind.as_ref().and_then(|w| w.speed)
    }

    pub fn wind_deg(&self) -> Option<f64> {
        self.wind.as_ref().and_then(|w| w.deg)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.main.as_ref().and_then(|m| m.temp)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenWeatherForecast {
    #[serde(default)]
    pub list: Vec<OpenWeatherEntry>,
}

/// Both OpenWeather payloads for one coordinate
#[derive(Debug, Clone)]
pub struct OpenWeatherResponse {
    pub current: OpenWeatherEntry,
    pub forecast: OpenWeatherForecast,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(config: &OpenWeatherConfig, client: Client) -> Self {
        Self {
            client,
            base_url: trim_base(&config.base_url),
            api_key: config.api_key.clone(),
        }
    }

    /// Fetch current conditions and forecast, or `None` on any failure.
    pub async fn fetch(&self, coordinate: Coordinate) -> Option<OpenWeatherResponse> {
        absorb(PROVIDER, coordinate, self.try_fetch(coordinate).await)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn try_fetch(
        &self,
        coordinate: Coordinate,
    ) -> Result<OpenWeatherResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey { provider: PROVIDER });
        }

        let (current, forecast) = tokio::try_join!(
            fetch_json::<OpenWeatherEntry>(PROVIDER, self.request("weather", coordinate)),
            fetch_json::<OpenWeatherForecast>(PROVIDER, self.request("forecast", coordinate)),
        )?;

        tracing::debug!(
            forecast_entries = forecast.list.len(),
            "Fetched OpenWeather data"
        );

        Ok(OpenWeatherResponse { current, forecast })
    }

    fn request(&self, endpoint: &str, coordinate: Coordinate) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, endpoint);
        self.client.get(url).query(&[
            ("lat", coordinate.latitude.to_string()),
            ("lon", coordinate.longitude.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ])
    }
}
