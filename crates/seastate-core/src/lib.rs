pub mod config;
pub mod error;

pub use config::{
    Config, OpenMeteoConfig, OpenWeatherConfig, PipelineConfig, StormglassConfig,
    ValidationResult, WaveAlignment, MAX_FORECAST_POINTS,
};
pub use error::{AppError, ConfigError};

use anyhow::Result;

/// Initialize tracing/logging
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Seastate core initialized");
    Ok(())
}
