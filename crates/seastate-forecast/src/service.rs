//! Forecast orchestration: cache, provider fallback, combine, normalize.
//!
//! Order of preference for a coordinate:
//! 1. a fresh cache entry
//! 2. OpenWeather (with Stormglass waves)
//! 3. Open-Meteo (with Stormglass waves)
//! 4. the synthetic series
//!
//! [`ForecastService::forecast`] never fails. Degraded output is visible only
//! through the returned [`Forecast::source`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use seastate_core::{Config, MAX_FORECAST_POINTS};
use tracing::instrument;

use crate::cache::{CacheStats, ForecastCache};
use crate::clock::{Clock, SystemClock};
use crate::coalesce::{CoalescerStats, Registration, RequestCoalescer};
use crate::combine::{combine_open_meteo, combine_openweather, MergeSettings};
use crate::error::{PipelineError, ProviderError};
use crate::normalize::normalize;
use crate::provider::{build_http_client, OpenMeteoClient, OpenWeatherClient, StormglassClient};
use crate::synthetic;
use crate::types::{Coordinate, Forecast};

#[derive(Debug)]
struct Inner {
    openweather: OpenWeatherClient,
    stormglass: StormglassClient,
    open_meteo: OpenMeteoClient,
    cache: ForecastCache,
    coalescer: Arc<RequestCoalescer>,
    clock: Arc<dyn Clock>,
    merge: MergeSettings,
    request_timeout: Duration,
    cache_synthetic: bool,
}

/// Cheap to clone; clones share the cache and HTTP client.
#[derive(Debug, Clone)]
pub struct ForecastService {
    inner: Arc<Inner>,
}

impl ForecastService {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, ProviderError> {
        let pipeline = &config.pipeline;
        let request_timeout = Duration::from_secs(pipeline.request_timeout_secs.max(1));
        let http = build_http_client(request_timeout)?;

        let mut merge = MergeSettings::from_config(config);
        merge.max_points = merge.max_points.clamp(1, MAX_FORECAST_POINTS);

        let inner = Inner {
            openweather: OpenWeatherClient::new(&config.openweather, http.clone()),
            stormglass: StormglassClient::new(&config.stormglass, http.clone()),
            open_meteo: OpenMeteoClient::new(&config.open_meteo, http),
            cache: ForecastCache::new(
                Duration::from_secs(pipeline.cache_ttl_secs),
                pipeline.cache_capacity,
                Arc::clone(&clock),
            ),
            coalescer: Arc::new(RequestCoalescer::new()),
            clock,
            merge,
            request_timeout,
            cache_synthetic: pipeline.cache_synthetic,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Forecast for `coordinate`, from cache when fresh.
    ///
    /// Concurrent misses for the same coordinate share one refresh. The
    /// refresh runs on its own task, so a caller that stops waiting does not
    /// prevent the cache from being populated.
    #[instrument(skip(self, coordinate), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    pub async fn forecast(&self, coordinate: Coordinate) -> Arc<Forecast> {
        if let Some(hit) = self.inner.cache.get(&coordinate) {
            tracing::debug!(source = %hit.source, "Forecast cache hit");
            return hit;
        }

        match self.inner.coalescer.register(&coordinate) {
            Registration::Coalesced(mut rx) => match rx.recv().await {
                Ok(forecast) => forecast,
                Err(_) => {
                    tracing::debug!("In-flight refresh ended without a result, refreshing");
                    self.inner.refresh(coordinate).await
                }
            },
            Registration::Leader(guard) => {
                let inner = Arc::clone(&self.inner);
                let task = tokio::spawn(async move {
                    // another leader may have filled the cache since our lookup
                    let forecast = match inner.cache.get(&coordinate) {
                        Some(hit) => hit,
                        None => inner.refresh(coordinate).await,
                    };
                    guard.complete(Arc::clone(&forecast));
                    forecast
                });

                match task.await {
                    Ok(forecast) => forecast,
                    Err(e) => {
                        tracing::error!(error = %e, "Forecast refresh task failed");
                        Arc::new(self.inner.synthetic(coordinate))
                    }
                }
            }
        }
    }

    /// Run the provider pipeline without consulting or updating the cache.
    pub async fn fetch_fresh(&self, coordinate: Coordinate) -> Result<Forecast, PipelineError> {
        self.inner.fetch_fresh(coordinate).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    pub fn coalescer_stats(&self) -> CoalescerStats {
        self.inner.coalescer.stats()
    }

    pub fn log_stats(&self) {
        self.inner.cache.log_stats();
        let stats = self.inner.coalescer.stats();
        tracing::info!(
            total_requests = stats.total_requests,
            coalesced = stats.coalesced_requests,
            coalescing_ratio = format!("{:.1}%", stats.coalescing_ratio() * 100.0),
            "Request coalescing statistics"
        );
    }
}

impl Inner {
    /// Fetch through the fallback chain and store the result.
    async fn refresh(&self, coordinate: Coordinate) -> Arc<Forecast> {
        let forecast = match self.fetch_fresh(coordinate).await {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::warn!(
                    lat = coordinate.latitude,
                    lon = coordinate.longitude,
                    error = %e,
                    "All providers failed, using synthetic forecast"
                );
                self.synthetic(coordinate)
            }
        };

        let forecast = Arc::new(forecast);
        if self.cache_synthetic || !forecast.is_synthetic() {
            self.cache.insert(&coordinate, Arc::clone(&forecast));
        }

        tracing::info!(
            source = %forecast.source,
            points = forecast.len(),
            "Forecast refreshed"
        );
        forecast
    }

    async fn fetch_fresh(&self, coordinate: Coordinate) -> Result<Forecast, PipelineError> {
        let (weather, waves) = tokio::join!(
            self.timed("openweather", coordinate, self.openweather.fetch(coordinate)),
            self.timed("stormglass", coordinate, self.stormglass.fetch(coordinate)),
        );

        let now = self.clock.now();
        let combined = match weather {
            Some(weather) => combine_openweather(&weather, waves.as_ref(), coordinate, &self.merge),
            None => {
                tracing::info!(
                    lat = coordinate.latitude,
                    lon = coordinate.longitude,
                    "OpenWeather unavailable, falling back to Open-Meteo"
                );
                let weather = self
                    .timed("open-meteo", coordinate, self.open_meteo.fetch(coordinate))
                    .await
                    .ok_or(PipelineError::NoWeatherData)?;
                combine_open_meteo(&weather, waves.as_ref(), coordinate, now, &self.merge)
            }
        };

        let points = normalize(&combined.hourly, now, self.merge.max_points);
        if points.is_empty() {
            return Err(PipelineError::EmptySeries);
        }

        Ok(Forecast {
            coordinate,
            source: combined.source,
            generated_at: now,
            points,
        })
    }

    /// Bound a provider call by the request timeout; expiry counts as failure.
    async fn timed<T>(
        &self,
        provider: &'static str,
        coordinate: Coordinate,
        call: impl Future<Output = Option<T>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    provider,
                    lat = coordinate.latitude,
                    lon = coordinate.longitude,
                    timeout_secs = self.request_timeout.as_secs(),
                    "Provider request timed out"
                );
                None
            }
        }
    }

    fn synthetic(&self, coordinate: Coordinate) -> Forecast {
        synthetic::forecast(coordinate, self.clock.now(), self.merge.max_points)
    }
}
