//! Marine forecast pipeline for seastate
//!
//! Aggregates OpenWeather, Stormglass and Open-Meteo into one hourly
//! wind/wave series per coordinate, with an in-memory TTL cache and a
//! deterministic synthetic fallback when every provider fails.

pub mod cache;
pub mod clock;
pub mod coalesce;
pub mod combine;
pub mod error;
pub mod format;
pub mod normalize;
pub mod provider;
pub mod service;
pub mod synthetic;
pub mod types;

pub use cache::{CacheStats, ForecastCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use coalesce::{CoalescerStats, RequestCoalescer};
pub use combine::MergeSettings;
pub use error::{PipelineError, ProviderError};
pub use normalize::{normalize, NoDataPolicy};
pub use service::ForecastService;
pub use types::*;
