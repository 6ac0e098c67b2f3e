//! Configuration management for Trailcast
//!
//! Loads settings from an optional TOML file plus `TRAILCAST_*` environment
//! variables and validates them before anything else starts.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::TrailcastError;
use crate::models::GeologyZone;
use crate::trail::{LookBack, ProjectionStrategy};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailcastConfig {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Zones served; the first one is the reference point for the forecast
    #[serde(default = "GeologyZone::castelli_romani")]
    pub zones: Vec<GeologyZone>,
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,
    #[serde(default = "default_archive_base_url")]
    pub archive_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_weather_max_retries")]
    pub max_retries: u32,
    /// IANA timezone the provider reports local times in
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When false an in-memory cache is used instead of the on-disk store
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_location")]
    pub location: String,
    #[serde(default = "default_forecast_ttl")]
    pub forecast_ttl_minutes: u32,
    #[serde(default = "default_history_ttl")]
    pub history_ttl_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Knobs of the evaluation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub look_back: LookBack,
    #[serde(default)]
    pub projection: ProjectionStrategy,
    /// The archive lags real time; history ends this many days before today
    #[serde(default = "default_history_lag_days")]
    pub history_lag_days: u32,
}

// Default value functions
fn default_forecast_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_archive_base_url() -> String {
    "https://archive-api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_weather_max_retries() -> u32 {
    3
}

fn default_timezone() -> String {
    "Europe/Rome".to_string()
}

fn default_forecast_days() -> u32 {
    3
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("trailcast"))
        .unwrap_or_else(|| PathBuf::from(".trailcast-cache"))
        .to_string_lossy()
        .into_owned()
}

fn default_forecast_ttl() -> u32 {
    60
}

fn default_history_ttl() -> u32 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_history_lag_days() -> u32 {
    2
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_base_url: default_forecast_base_url(),
            archive_base_url: default_archive_base_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: default_weather_max_retries(),
            timezone: default_timezone(),
            forecast_days: default_forecast_days(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            location: default_cache_location(),
            forecast_ttl_minutes: default_forecast_ttl(),
            history_ttl_minutes: default_history_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            look_back: LookBack::default(),
            projection: ProjectionStrategy::default(),
            history_lag_days: default_history_lag_days(),
        }
    }
}

impl Default for TrailcastConfig {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            engine: EngineConfig::default(),
            zones: GeologyZone::castelli_romani(),
        }
    }
}

impl TrailcastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRAILCAST_ENGINE__LOOK_BACK=five_day
        builder = builder.add_source(
            Environment::with_prefix("TRAILCAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TrailcastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("trailcast").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.forecast_base_url.is_empty() {
            self.weather.forecast_base_url = default_forecast_base_url();
        }
        if self.weather.archive_base_url.is_empty() {
            self.weather.archive_base_url = default_archive_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.weather.timezone.is_empty() {
            self.weather.timezone = default_timezone();
        }
        if self.weather.forecast_days == 0 {
            self.weather.forecast_days = default_forecast_days();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.cache.forecast_ttl_minutes == 0 {
            self.cache.forecast_ttl_minutes = default_forecast_ttl();
        }
        if self.cache.history_ttl_minutes == 0 {
            self.cache.history_ttl_minutes = default_history_ttl();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_zones()?;
        Ok(())
    }

    /// The provider timezone, parsed
    pub fn timezone(&self) -> Result<Tz> {
        self.weather.timezone.parse::<Tz>().map_err(|_| {
            TrailcastError::config(format!("Unknown timezone '{}'", self.weather.timezone)).into()
        })
    }

    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(&self.cache.location)
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                TrailcastError::config("Weather API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.weather.max_retries > 10 {
            return Err(TrailcastError::config("Weather API max retries cannot exceed 10").into());
        }

        if !(1..=16).contains(&self.weather.forecast_days) {
            return Err(TrailcastError::config("Forecast days must be between 1 and 16").into());
        }

        if self.cache.forecast_ttl_minutes > 24 * 60 || self.cache.history_ttl_minutes > 24 * 60 {
            return Err(TrailcastError::config("Cache TTL cannot exceed 24 hours").into());
        }

        if !(1..=5).contains(&self.engine.history_lag_days) {
            return Err(
                TrailcastError::config("History lag must be between 1 and 5 days").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TrailcastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "compact"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TrailcastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for url in [&self.weather.forecast_base_url, &self.weather.archive_base_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TrailcastError::config(format!(
                    "Weather API base URL '{url}' must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        self.timezone()?;
        Ok(())
    }

    fn validate_zones(&self) -> Result<()> {
        if self.zones.is_empty() {
            return Err(TrailcastError::config("At least one zone must be configured").into());
        }

        let mut seen = HashSet::new();
        for zone in &self.zones {
            if zone.key.is_empty() {
                return Err(TrailcastError::config("Zone key cannot be empty").into());
            }
            if !seen.insert(zone.key.as_str()) {
                return Err(
                    TrailcastError::config(format!("Duplicate zone key '{}'", zone.key)).into(),
                );
            }
            if !(-90.0..=90.0).contains(&zone.lat) || !(-180.0..=180.0).contains(&zone.lon) {
                return Err(TrailcastError::config(format!(
                    "Zone '{}' has coordinates out of range",
                    zone.key
                ))
                .into());
            }
            if zone.drainage_rate <= 0.0 {
                return Err(TrailcastError::config(format!(
                    "Zone '{}' must have a positive drainage rate",
                    zone.key
                ))
                .into());
            }
        }

        Ok(())
    }
}
