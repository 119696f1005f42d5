use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub const OPENWEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const STORMGLASS_API_KEY_ENV: &str = "STORMGLASS_API_KEY";

/// Upper bound on points in a forecast series (10 days of hourly data).
pub const MAX_FORECAST_POINTS: usize = 240;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Primary weather provider
    #[serde(default)]
    pub openweather: OpenWeatherConfig,

    /// Wave provider
    #[serde(default)]
    pub stormglass: StormglassConfig,

    /// Secondary weather provider, used when OpenWeather fails
    #[serde(default)]
    pub open_meteo: OpenMeteoConfig,

    /// Cache, timeout and merge settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenWeatherConfig {
    /// API key (overridden by `OPENWEATHER_API_KEY` when set)
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_openweather_url")]
    pub base_url: String,
}

fn default_openweather_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openweather_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StormglassConfig {
    /// API key (overridden by `STORMGLASS_API_KEY` when set)
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_stormglass_url")]
    pub base_url: String,

    /// Measurement/model sources consulted in order when picking a wave value.
    /// Sources not listed here are consulted afterwards in name order.
    #[serde(default = "default_source_priority")]
    pub source_priority: Vec<String>,
}

fn default_stormglass_url() -> String {
    "https://api.stormglass.io/v2".to_string()
}

pub fn default_source_priority() -> Vec<String> {
    [
        "sg", "noaa", "meteo", "icon", "dwd", "ecmwf", "meto", "fcoo", "fmi", "smhi", "yr",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for StormglassConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_stormglass_url(),
            source_priority: default_source_priority(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMeteoConfig {
    #[serde(default = "default_open_meteo_forecast_url")]
    pub forecast_url: String,

    #[serde(default = "default_open_meteo_marine_url")]
    pub marine_url: String,

    /// Days of hourly data to request
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,

    /// Also query the marine endpoint for wave height/period
    #[serde(default = "default_true")]
    pub include_marine: bool,
}

fn default_open_meteo_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_open_meteo_marine_url() -> String {
    "https://marine-api.open-meteo.com/v1/marine".to_string()
}

fn default_forecast_days() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_open_meteo_forecast_url(),
            marine_url: default_open_meteo_marine_url(),
            forecast_days: default_forecast_days(),
            include_marine: true,
        }
    }
}

/// How wave-provider hours are matched to weather hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WaveAlignment {
    /// Match by UTC hour; entries without a timestamp fall back to index.
    #[default]
    Timestamp,
    /// Match by array index.
    Positional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Per-call timeout for every provider request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Maximum number of coordinates kept in the cache (LRU eviction)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Points per series, 1..=240
    #[serde(default = "default_max_points")]
    pub max_points: usize,

    #[serde(default)]
    pub wave_alignment: WaveAlignment,

    /// Store synthetic fallback series in the cache like real data
    #[serde(default = "default_true")]
    pub cache_synthetic: bool,
}

fn default_request_timeout() -> u64 {
    10
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_cache_capacity() -> usize {
    1024
}

fn default_max_points() -> usize {
    MAX_FORECAST_POINTS
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
            max_points: default_max_points(),
            wave_alignment: WaveAlignment::default(),
            cache_synthetic: true,
        }
    }
}

impl Config {
    /// Load configuration from the user config directory, creating a default
    /// file if it doesn't exist. API keys from the environment take precedence.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save_to_path(&config_path)?;
            return Ok(config.with_env_overrides());
        }

        Self::load_from_path(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file {}", path.as_ref().display())
        })?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(OPENWEATHER_API_KEY_ENV) {
            if !key.is_empty() {
                self.openweather.api_key = key;
            }
        }
        if let Ok(key) = std::env::var(STORMGLASS_API_KEY_ENV) {
            if !key.is_empty() {
                self.stormglass.api_key = key;
            }
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.openweather.base_url, "openweather.base_url", &mut result);
        validate_url(&self.stormglass.base_url, "stormglass.base_url", &mut result);
        validate_url(&self.open_meteo.forecast_url, "open_meteo.forecast_url", &mut result);
        if self.open_meteo.include_marine {
            validate_url(&self.open_meteo.marine_url, "open_meteo.marine_url", &mut result);
        }

        if self.openweather.api_key.is_empty() {
            result.add_warning(
                "openweather.api_key",
                "No API key - primary weather requests will fail and fall back to Open-Meteo",
            );
        }
        if self.stormglass.api_key.is_empty() {
            result.add_warning(
                "stormglass.api_key",
                "No API key - wave data will come from fallback sources",
            );
        }
        if self.stormglass.source_priority.is_empty() {
            result.add_warning(
                "stormglass.source_priority",
                "Empty priority list - wave sources will be consulted in name order",
            );
        }

        if self.open_meteo.forecast_days == 0 {
            result.add_error("open_meteo.forecast_days", "Must request at least one day");
        } else if self.open_meteo.forecast_days > 16 {
            result.add_warning(
                "open_meteo.forecast_days",
                "Open-Meteo serves at most 16 days of hourly data",
            );
        }

        let pipeline = &self.pipeline;
        if pipeline.request_timeout_secs == 0 {
            result.add_error("pipeline.request_timeout_secs", "Timeout must be greater than 0");
        } else if pipeline.request_timeout_secs > 120 {
            result.add_warning(
                "pipeline.request_timeout_secs",
                "Timeout is unusually long (>120s)",
            );
        }

        if pipeline.cache_ttl_secs == 0 {
            result.add_error("pipeline.cache_ttl_secs", "Cache TTL must be greater than 0");
        }

        if pipeline.cache_capacity == 0 {
            result.add_error("pipeline.cache_capacity", "Cache capacity must be greater than 0");
        }

        if pipeline.max_points == 0 || pipeline.max_points > MAX_FORECAST_POINTS {
            result.add_error(
                "pipeline.max_points",
                format!("Must be between 1 and {}", MAX_FORECAST_POINTS),
            );
        }

        result
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("seastate");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
