//! seastate CLI - print the marine forecast for one coordinate as JSON

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use seastate_core::{AppError, Config, ConfigError};
use seastate_forecast::{Coordinate, ForecastService};

#[derive(Parser)]
#[command(name = "seastate")]
#[command(about = "Hourly wind and wave forecast for a coordinate", long_about = None)]
struct Args {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = seastate_core::init() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "seastate failed");
        eprintln!("Error: {}", e);
        eprintln!("{}", e.user_message());
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&args.lat) || !(-180.0..=180.0).contains(&args.lon) {
        return Err(anyhow::anyhow!(
            "coordinate out of range: latitude must be in [-90, 90], longitude in [-180, 180]"
        )
        .into());
    }

    let config = load_config(args.config)?;
    let service = ForecastService::new(&config).context("Failed to build HTTP client")?;

    let coordinate = Coordinate::new(args.lat, args.lon);
    let forecast = service.forecast(coordinate).await;

    if forecast.is_synthetic() {
        tracing::warn!(%coordinate, "Returning synthetic forecast; no provider data was available");
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(forecast.as_ref())
    } else {
        serde_json::to_string(forecast.as_ref())
    }
    .context("Failed to serialize forecast")?;

    println!("{}", json);
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    if let Some(path) = &path {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
    }

    let config = match &path {
        Some(p) => Config::load_from_path(p),
        None => Config::load(),
    }
    .map_err(|e| ConfigError::ParseError(format!("{:#}", e)))?;

    let validation = config.validate();
    if !validation.is_valid() {
        return Err(ConfigError::Invalid(validation.error_summary()));
    }
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }

    tracing::debug!(
        ttl_secs = config.pipeline.cache_ttl_secs,
        timeout_secs = config.pipeline.request_timeout_secs,
        "Configuration loaded"
    );
    Ok(config)
}
