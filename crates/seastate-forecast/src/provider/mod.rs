//! Upstream provider adapters.
//!
//! Each adapter exposes `fetch`, which never fails: any transport error,
//! non-success status or malformed body is logged and reported as `None`.
//! `try_fetch` keeps the typed error for callers and tests that want it.

pub mod open_meteo;
pub mod openweather;
pub mod stormglass;

pub use open_meteo::{OpenMeteoClient, OpenMeteoResponse};
pub use openweather::{OpenWeatherClient, OpenWeatherResponse};
pub use stormglass::{StormglassClient, StormglassHour, StormglassResponse};

use crate::error::ProviderError;
use crate::types::Coordinate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("seastate/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by all adapters.
pub fn build_http_client(timeout: Duration) -> Result<Client, ProviderError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Send a request and decode a JSON body, mapping every failure to a
/// provider-tagged error.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, e))?;

    serde_json::from_str(&body).map_err(|e| ProviderError::Parse {
        provider,
        message: e.to_string(),
    })
}

/// Reduce a provider result to the null sentinel, logging the failure.
pub(crate) fn absorb<T>(
    provider: &'static str,
    coordinate: Coordinate,
    result: Result<T, ProviderError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                provider,
                lat = coordinate.latitude,
                lon = coordinate.longitude,
                error = %e,
                "Provider request failed"
            );
            None
        }
    }
}

/// Strip a trailing slash so `{base}/path` joins cleanly.
pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
