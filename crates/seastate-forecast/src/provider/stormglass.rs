//! Stormglass adapter: hourly wave estimates, each reported by several
//! measurement/model sources.

use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use seastate_core::StormglassConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::instrument;

use super::{absorb, fetch_json, trim_base};
use crate::error::ProviderError;
use crate::types::Coordinate;

pub const PROVIDER: &str = "stormglass";

const PARAMS: &str = "waveHeight,swellHeight,waveDirection,wavePeriod";

/// Per-source readings for one metric, e.g. `{"noaa": 1.2, "sg": null}`.
pub type SourceValues = BTreeMap<String, Option<f64>>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StormglassHour {
    pub time: Option<DateTime<Utc>>,
    #[serde(rename = "waveHeight", default)]
    pub wave_height: SourceValues,
    #[serde(rename = "wavePeriod", default)]
    pub wave_period: SourceValues,
    #[serde(rename = "waveDirection", default)]
    pub wave_direction: SourceValues,
    #[serde(rename = "swellHeight", default)]
    pub swell_height: SourceValues,
}

impl StormglassHour {
    pub fn wave_height_m(&self, priority: &[String]) -> Option<f64> {
        pick_source(&self.wave_height, priority)
    }

    pub fn wave_period_s(&self, priority: &[String]) -> Option<f64> {
        pick_source(&self.wave_period, priority)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StormglassResponse {
    #[serde(default)]
    pub hours: Vec<StormglassHour>,
}

/// First non-null value following `priority`, then any remaining sources in
/// name order.
pub fn pick_source(values: &SourceValues, priority: &[String]) -> Option<f64> {
    let usable = |v: &Option<f64>| v.filter(|x| x.is_finite());

    priority
        .iter()
        .find_map(|name| values.get(name).and_then(usable))
        .or_else(|| {
            values
                .iter()
                .filter(|(name, _)| !priority.contains(name))
                .find_map(|(_, v)| usable(v))
        })
}

#[derive(Debug, Clone)]
pub struct StormglassClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl StormglassClient {
    pub fn new(config: &StormglassConfig, client: Client) -> Self {
        Self {
            client,
            base_url: trim_base(&config.base_url),
            api_key: config.api_key.clone(),
        }
    }

    /// Fetch hourly wave data, or `None` on any failure.
    pub async fn fetch(&self, coordinate: Coordinate) -> Option<StormglassResponse> {
        absorb(PROVIDER, coordinate, self.try_fetch(coordinate).await)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn try_fetch(
        &self,
        coordinate: Coordinate,
    ) -> Result<StormglassResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey { provider: PROVIDER });
        }

        let url = format!("{}/weather/point", self.base_url);
        let request = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, &self.api_key)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lng", coordinate.longitude.to_string()),
                ("params", PARAMS.to_string()),
            ]);

        let response: StormglassResponse = fetch_json(PROVIDER, request).await?;
        if response.hours.is_empty() {
            return Err(ProviderError::Empty { provider: PROVIDER });
        }

        tracing::debug!(hours = response.hours.len(), "Fetched Stormglass wave data");
        Ok(response)
    }
}
