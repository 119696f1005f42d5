//! Forecast pipeline error types.
//!
//! None of these reach the caller of [`crate::ForecastService::forecast`]:
//! provider errors are absorbed at the adapter boundary and pipeline errors
//! are replaced by the synthetic series.

use thiserror::Error;

/// Failure of a single upstream provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider}: no API key configured")]
    MissingApiKey { provider: &'static str },

    #[error("{provider}: request timed out")]
    Timeout { provider: &'static str },

    #[error("{provider}: connection failed: {message}")]
    Connection {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: server returned {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider}: malformed response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: response contained no data")]
    Empty { provider: &'static str },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ProviderError {
    /// Classify a transport error from reqwest.
    pub fn from_reqwest(provider: &'static str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ProviderError::Timeout { provider }
        } else if let Some(status) = error.status() {
            ProviderError::Status {
                provider,
                status: status.as_u16(),
            }
        } else if error.is_decode() {
            ProviderError::Parse {
                provider,
                message: error.to_string(),
            }
        } else {
            ProviderError::Connection {
                provider,
                message: error.to_string(),
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }
}

/// Failure inside the combine/normalize stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no weather provider returned data")]
    NoWeatherData,

    #[error("normalized series is empty")]
    EmptySeries,

    #[error("could not format Open-Meteo data: {0}")]
    Format(String),
}
