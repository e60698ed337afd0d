#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Layered configuration for the trail map toolchain.
//!
//! Configuration is resolved in three layers:
//!
//! 1. **Built-in defaults** from `config/default.toml`, embedded at compile
//!    time.
//! 2. **User file** (optional), deep-merged over the defaults key by key so
//!    a file only needs to name what it changes.
//! 3. **Environment overrides** for the handful of values that differ per
//!    deployment (API host, data URLs, geocoder token).

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Built-in defaults.
const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Environment variable overriding [`ApiConfig::host`].
pub const ENV_API_HOST: &str = "TRAIL_MAP_API_HOST";
/// Environment variable overriding [`TrailsConfig::url`].
pub const ENV_TRAILS_URL: &str = "TRAIL_MAP_TRAILS_URL";
/// Environment variable overriding [`NeighborsConfig::precinct_url`].
pub const ENV_PRECINCT_URL: &str = "TRAIL_MAP_PRECINCT_URL";
/// Environment variable overriding [`GeocoderConfig::access_token`].
pub const ENV_MAPBOX_TOKEN: &str = "MAPBOX_ACCESS_TOKEN";

/// Placeholder substituted with the precinct identifier in
/// [`NeighborsConfig::precinct_url`].
pub const PRECINCT_PLACEHOLDER: &str = "{precinct}";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path of the file that could not be read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The TOML could not be parsed or did not match the schema.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value parsed but is not usable.
    #[error("Invalid config value for {key}: {message}")]
    Invalid {
        /// Dotted key of the offending value.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Issue API settings.
    pub api: ApiConfig,
    /// Trail dataset settings.
    pub trails: TrailsConfig,
    /// Map view settings.
    pub map: MapConfig,
    /// Neighbor panel settings.
    pub neighbors: NeighborsConfig,
    /// Geocoder settings.
    pub geocoder: GeocoderConfig,
}

/// Issue persistence API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API (e.g. `"https://trails.example.org"`), without
    /// a trailing `/trail_issues/`.
    pub host: String,
}

impl ApiConfig {
    /// URL of the trail issue collection endpoint.
    #[must_use]
    pub fn trail_issues_url(&self) -> String {
        format!("{}/trail_issues/", self.host.trim_end_matches('/'))
    }
}

/// External trail geometry dataset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrailsConfig {
    /// URL returning a `GeoJSON` `FeatureCollection` of trail lines.
    pub url: String,
    /// Feature property holding the trail identifier.
    pub id_property: String,
    /// Feature property holding the trail label.
    pub label_property: String,
}

/// Map view settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapConfig {
    /// Initial center latitude.
    pub center_lat: f64,
    /// Initial center longitude.
    pub center_lng: f64,
    /// Initial zoom level.
    pub zoom: u8,
    /// Base tile URL template with `{z}`, `{x}`, `{y}` placeholders.
    pub tile_url: String,
    /// Attribution HTML shown for the tile layer.
    pub attribution: String,
    /// Map viewport width in pixels.
    pub viewport_width: u32,
    /// Map viewport height in pixels.
    pub viewport_height: u32,
    /// Width taken from the viewport while the report panel is open.
    pub report_panel_width: u32,
    /// How close (in meters) a click must be to a trail to select it.
    pub trail_click_tolerance_m: f64,
}

/// Neighbor panel settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NeighborsConfig {
    /// Per-precinct CSV URL template containing `{precinct}`.
    pub precinct_url: String,
    /// Precinct shown at startup.
    pub default_precinct: String,
    /// City appended to voter street addresses.
    pub city: String,
    /// State appended to voter street addresses.
    pub state: String,
    /// ZIP code appended to voter street addresses.
    pub zip: String,
}

impl NeighborsConfig {
    /// Returns the CSV URL for a precinct.
    #[must_use]
    pub fn precinct_csv_url(&self, precinct: &str) -> String {
        self.precinct_url.replace(PRECINCT_PLACEHOLDER, precinct)
    }
}

/// Forward geocoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeocoderConfig {
    /// Base URL; the address and `.json` are appended as a path segment.
    pub base_url: String,
    /// Access token sent as the `access_token` query parameter.
    pub access_token: String,
}

impl AppConfig {
    /// Returns the built-in defaults.
    ///
    /// # Panics
    ///
    /// Panics if the embedded default TOML is malformed (a development
    /// error caught by tests).
    #[must_use]
    pub fn defaults() -> Self {
        toml::from_str(DEFAULT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default config: {e}"))
    }

    /// Loads configuration from the defaults, an optional user file, and
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or the
    /// resulting configuration is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let user = match path {
            Some(path) => {
                log::debug!("Reading config file {}", path.display());
                Some(
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                        path: path.display().to_string(),
                        source,
                    })?,
                )
            }
            None => None,
        };

        Self::from_layers(user.as_deref(), |key| std::env::var(key).ok())
    }

    /// Resolves configuration from an optional user TOML document and an
    /// environment lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML cannot be parsed or the result
    /// fails validation.
    pub fn from_layers(
        user_toml: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut merged: toml::Table = toml::from_str(DEFAULT_TOML)?;

        if let Some(user_toml) = user_toml {
            let user: toml::Table = toml::from_str(user_toml)?;
            merge_tables(&mut merged, user);
        }

        let mut config: Self = toml::Value::Table(merged).try_into()?;
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let overrides: [(&str, &mut String); 4] = [
            (ENV_API_HOST, &mut self.api.host),
            (ENV_TRAILS_URL, &mut self.trails.url),
            (ENV_PRECINCT_URL, &mut self.neighbors.precinct_url),
            (ENV_MAPBOX_TOKEN, &mut self.geocoder.access_token),
        ];

        for (key, slot) in overrides {
            if let Some(value) = env(key).filter(|v| !v.trim().is_empty()) {
                log::debug!("Config override from ${key}");
                *slot = value;
            }
        }
    }

    /// Checks the values that would otherwise fail later at request time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "api.host",
                message: "must not be empty".to_string(),
            });
        }
        if self.trails.url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "trails.url",
                message: "must not be empty".to_string(),
            });
        }
        if !self.neighbors.precinct_url.contains(PRECINCT_PLACEHOLDER) {
            return Err(ConfigError::Invalid {
                key: "neighbors.precinct_url",
                message: format!("must contain {PRECINCT_PLACEHOLDER}"),
            });
        }
        if self.map.zoom > 22 {
            return Err(ConfigError::Invalid {
                key: "map.zoom",
                message: format!("{} is outside 0-22", self.map.zoom),
            });
        }
        if self.map.report_panel_width >= self.map.viewport_width {
            return Err(ConfigError::Invalid {
                key: "map.report_panel_width",
                message: "must be narrower than the viewport".to_string(),
            });
        }
        Ok(())
    }
}

/// Recursively merges `overlay` into `base`. Nested tables merge key by
/// key; any other value replaces the base value.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                merge_tables(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
