//! Configuration management for the `nearby` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::NearbyError;
use crate::location::SIMULATED_LOCATION;
use crate::models::{Coordinate, PlaceCategory, place::DEFAULT_RADIUS_METERS};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `nearby` application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyConfig {
    /// Overpass API configuration
    #[serde(default)]
    pub overpass: OverpassConfig,
    /// Search origin
    #[serde(default)]
    pub location: LocationConfig,
    /// Search defaults
    #[serde(default)]
    pub search: SearchConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Overpass API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassConfig {
    /// Interpreter endpoint receiving the `data` query parameter
    #[serde(default = "default_overpass_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds; the HTTP client default applies when unset
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Search origin used by the fixed location provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search radius in metres
    #[serde(default = "default_radius_meters")]
    pub radius_meters: u32,
    /// Category searched on start and when none is given
    #[serde(default)]
    pub default_category: PlaceCategory,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_overpass_endpoint() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_user_agent() -> String {
    format!("nearby/{}", crate::VERSION)
}

fn default_latitude() -> f64 {
    SIMULATED_LOCATION.latitude
}

fn default_longitude() -> f64 {
    SIMULATED_LOCATION.longitude
}

fn default_radius_meters() -> u32 {
    DEFAULT_RADIUS_METERS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: default_overpass_endpoint(),
            timeout_seconds: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            radius_meters: default_radius_meters(),
            default_category: PlaceCategory::default(),
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

impl Default for NearbyConfig {
    fn default() -> Self {
        Self {
            overpass: OverpassConfig::default(),
            location: LocationConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl LocationConfig {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl NearbyConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
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

        // NEARBY_SEARCH__RADIUS_METERS=500 overrides search.radius_meters
        builder = builder.add_source(
            Environment::with_prefix("NEARBY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: NearbyConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nearby").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.overpass.endpoint.is_empty() {
            self.overpass.endpoint = default_overpass_endpoint();
        }
        if self.overpass.user_agent.is_empty() {
            self.overpass.user_agent = default_user_agent();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if let Some(timeout) = self.overpass.timeout_seconds {
            if timeout == 0 || timeout > 300 {
                return Err(NearbyError::config(
                    "Overpass timeout must be between 1 and 300 seconds",
                )
                .into());
            }
        }

        if !(1..=50_000).contains(&self.search.radius_meters) {
            return Err(NearbyError::config(
                "Search radius must be between 1 and 50000 meters",
            )
            .into());
        }

        if !self.location.coordinate().is_valid() {
            return Err(NearbyError::config(format!(
                "Location ({}, {}) is outside the valid latitude/longitude range",
                self.location.latitude, self.location.longitude
            ))
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(NearbyError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(NearbyError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.overpass.endpoint.starts_with("http://")
            && !self.overpass.endpoint.starts_with("https://")
        {
            return Err(NearbyError::config(
                "Overpass endpoint must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}
