//! Integration tests for the provider adapters using wiremock.

use std::time::Duration;

use seastate_core::{OpenMeteoConfig, OpenWeatherConfig, StormglassConfig};
use seastate_forecast::provider::{
    build_http_client, OpenMeteoClient, OpenWeatherClient, StormglassClient,
};
use seastate_forecast::{Coordinate, ProviderError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE_DT: i64 = 1_699_999_200;

fn coord() -> Coordinate {
    Coordinate::new(19.076, 72.8777)
}

fn http() -> reqwest::Client {
    build_http_client(Duration::from_secs(5)).unwrap()
}

fn openweather_client(server: &MockServer) -> OpenWeatherClient {
    let config = OpenWeatherConfig {
        api_key: "ow-key".to_string(),
        base_url: format!("{}/ow/", server.uri()),
    };
    OpenWeatherClient::new(&config, http())
}

fn stormglass_client(server: &MockServer) -> StormglassClient {
    let config = StormglassConfig {
        api_key: "sg-key".to_string(),
        base_url: format!("{}/sg", server.uri()),
        ..Default::default()
    };
    StormglassClient::new(&config, http())
}

fn open_meteo_client(server: &MockServer) -> OpenMeteoClient {
    let config = OpenMeteoConfig {
        forecast_url: format!("{}/om/forecast", server.uri()),
        marine_url: format!("{}/om/marine", server.uri()),
        ..Default::default()
    };
    OpenMeteoClient::new(&config, http())
}

/// Helper to create an OpenWeather entry
fn ow_entry(dt: i64, speed: f64, deg: f64) -> serde_json::Value {
    serde_json::json!({
        "dt": dt,
        "wind": {"speed": speed, "deg": deg},
        "main": {"temp": 27.5}
    })
}

#[tokio::test]
async fn test_openweather_fetch_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ow/weather"))
        .and(query_param("appid", "ow-key"))
        .and(query_param("units", "metric"))
        .and(query_param("lat", "19.076"))
        .and(query_param("lon", "72.8777"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_entry(BASE_DT, 4.0, 90.0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ow/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cod": "200",
            "list": [
                ow_entry(BASE_DT + 3600, 5.0, 100.0),
                ow_entry(BASE_DT + 7200, 6.0, 110.0),
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = openweather_client(&mock_server);
    let response = client.try_fetch(coord()).await.unwrap();

    assert_eq!(response.current.wind_speed(), Some(4.0));
    assert_eq!(response.forecast.list.len(), 2);
    assert_eq!(response.forecast.list[1].wind_deg(), Some(110.0));
}

#[tokio::test]
async fn test_openweather_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let client = openweather_client(&mock_server);
    let result = client.try_fetch(coord()).await;

    assert!(matches!(
        result,
        Err(ProviderError::Status { status: 401, .. })
    ));
    assert!(client.fetch(coord()).await.is_none());
}

#[tokio::test]
async fn test_openweather_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = openweather_client(&mock_server);
    let result = client.try_fetch(coord()).await;

    assert!(matches!(result, Err(ProviderError::Parse { .. })));
}

#[tokio::test]
async fn test_stormglass_fetch_sends_key_and_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sg/weather/point"))
        .and(header("authorization", "sg-key"))
        .and(query_param("lat", "19.076"))
        .and(query_param("lng", "72.8777"))
        .and(query_param("params", "waveHeight,swellHeight,waveDirection,wavePeriod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hours": [
                {
                    "time": "2023-11-14T22:00:00+00:00",
                    "waveHeight": {"A": 1.23, "B": null},
                    "wavePeriod": {"noaa": 8.0, "sg": 8.5}
                }
            ],
            "meta": {"cost": 1, "dailyQuota": 10}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = stormglass_client(&mock_server);
    let response = client.try_fetch(coord()).await.unwrap();
    let priority = seastate_core::config::default_source_priority();

    assert_eq!(response.hours.len(), 1);
    assert_eq!(response.hours[0].wave_height_m(&priority), Some(1.23));
    assert_eq!(response.hours[0].wave_period_s(&priority), Some(8.5));
}

#[tokio::test]
async fn test_stormglass_empty_hours() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sg/weather/point"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"hours": []})))
        .mount(&mock_server)
        .await;

    let client = stormglass_client(&mock_server);
    let result = client.try_fetch(coord()).await;

    assert!(matches!(result, Err(ProviderError::Empty { .. })));
}

#[tokio::test]
async fn test_stormglass_without_key_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = StormglassConfig {
        base_url: format!("{}/sg", mock_server.uri()),
        ..Default::default()
    };
    let client = StormglassClient::new(&config, http());

    assert!(client.fetch(coord()).await.is_none());
}

#[tokio::test]
async fn test_open_meteo_weather_and_marine() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/om/forecast"))
        .and(query_param("hourly", "temperature_2m,windspeed_10m,winddirection_10m"))
        .and(query_param("current_weather", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "current_weather": {"time": "2023-11-14T22:00", "windspeed": 18.0, "winddirection": 200},
            "hourly": {
                "time": ["2023-11-14T22:00", "2023-11-14T23:00"],
                "temperature_2m": [27.0, 26.5],
                "windspeed_10m": [18.0, 21.6],
                "winddirection_10m": [200, 210]
            }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/om/marine"))
        .and(query_param("hourly", "wave_height,wave_period,wave_direction"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hourly": {
                "time": ["2023-11-14T22:00", "2023-11-14T23:00"],
                "wave_height": [0.9, 1.0],
                "wave_period": [7.0, null]
            }
        })))
        .mount(&mock_server)
        .await;

    let client = open_meteo_client(&mock_server);
    let response = client.try_fetch(coord()).await.unwrap();

    assert_eq!(response.weather.hourly.time.len(), 2);
    let marine = response.marine.unwrap();
    assert_eq!(marine.hourly.wave_height, vec![Some(0.9), Some(1.0)]);
    assert_eq!(marine.hourly.wave_period, vec![Some(7.0), None]);
}

#[tokio::test]
async fn test_open_meteo_marine_failure_is_not_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/om/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hourly": {
                "time": ["2023-11-14T22:00"],
                "windspeed_10m": [10.0]
            }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/om/marine"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": true,
            "reason": "No data is available for this location"
        })))
        .mount(&mock_server)
        .await;

    let client = open_meteo_client(&mock_server);
    let response = client.try_fetch(coord()).await.unwrap();

    assert!(response.marine.is_none());
    assert_eq!(response.weather.hourly.windspeed_10m, vec![Some(10.0)]);
}

#[tokio::test]
async fn test_open_meteo_empty_hourly() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/om/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"hourly": {"time": []}})))
        .mount(&mock_server)
        .await;

    let client = open_meteo_client(&mock_server);
    let result = client.try_fetch(coord()).await;

    assert!(matches!(result, Err(ProviderError::Empty { .. })));
}

#[tokio::test]
async fn test_connection_refused_is_absorbed() {
    // nothing listens on the discard port
    let config = OpenWeatherConfig {
        api_key: "ow-key".to_string(),
        base_url: "http://127.0.0.1:9".to_string(),
    };
    let client = OpenWeatherClient::new(&config, http());

    let result = client.try_fetch(coord()).await;
    assert!(matches!(result, Err(ProviderError::Connection { .. })));
    assert!(client.fetch(coord()).await.is_none());
}
