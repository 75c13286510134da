//! Service configuration.
//!
//! Read from environment variables at startup. Unset variables take their
//! defaults; set but unparseable values are errors.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;

use crate::domain::Coordinates;
use crate::inference::ModelConfig;
use crate::weather::{DEFAULT_BASE_URL, DEFAULT_FALLBACK_TEMPERATURE, WeatherConfig};

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding the GTFS text files
    pub gtfs_dir: PathBuf,
    pub models: ModelConfig,
    pub bind_addr: SocketAddr,
    /// Weather API key. `None` selects the fixed fallback temperature.
    pub weather_api_key: Option<String>,
    pub weather_url: String,
    /// Reference location for distance-from-center and weather
    pub city_center: Coordinates,
    /// Zone used to read epoch departures and forecast hours
    pub timezone: Tz,
    /// Kelvin
    pub fallback_temperature: f64,
    pub catalog_refresh_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            gtfs_dir: PathBuf::from("data/gtfs"),
            models: ModelConfig::new("data/models"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            weather_api_key: None,
            weather_url: DEFAULT_BASE_URL.to_string(),
            city_center: Coordinates::DUBLIN_CITY_CENTER,
            timezone: chrono_tz::Europe::Dublin,
            fallback_temperature: DEFAULT_FALLBACK_TEMPERATURE,
            catalog_refresh_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's
    /// value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get("JT_GTFS_DIR") {
            config.gtfs_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("JT_MODEL_DIR") {
            config.models = ModelConfig::new(dir);
        }
        if let Some(file) = get("JT_STOP_TO_STOP_MODEL") {
            config.models = config.models.with_stop_to_stop_file(file);
        }
        if let Some(addr) = get("JT_BIND_ADDR") {
            config.bind_addr = parse("JT_BIND_ADDR", &addr)?;
        }
        config.weather_api_key = get("OPENWEATHER_API_KEY");
        if let Some(url) = get("OPENWEATHER_URL") {
            config.weather_url = url;
        }

        let lat = match get("JT_CITY_CENTER_LAT") {
            Some(v) => parse("JT_CITY_CENTER_LAT", &v)?,
            None => config.city_center.lat(),
        };
        let lon = match get("JT_CITY_CENTER_LON") {
            Some(v) => parse("JT_CITY_CENTER_LON", &v)?,
            None => config.city_center.lon(),
        };
        config.city_center = Coordinates::new(lat, lon).map_err(|e| ConfigError::Invalid {
            var: "JT_CITY_CENTER_LAT/JT_CITY_CENTER_LON",
            value: format!("{lat}, {lon}"),
            reason: e.to_string(),
        })?;

        if let Some(tz) = get("JT_TIMEZONE") {
            config.timezone = parse("JT_TIMEZONE", &tz)?;
        }
        if let Some(temp) = get("JT_FALLBACK_TEMPERATURE") {
            config.fallback_temperature = parse("JT_FALLBACK_TEMPERATURE", &temp)?;
        }
        if let Some(secs) = get("JT_CATALOG_REFRESH_SECS") {
            let secs: u64 = parse("JT_CATALOG_REFRESH_SECS", &secs)?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: "JT_CATALOG_REFRESH_SECS",
                    value: "0".to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            config.catalog_refresh_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Weather client settings, if an API key is configured.
    pub fn weather(&self) -> Option<WeatherConfig> {
        self.weather_api_key.as_ref().map(|key| {
            WeatherConfig::new(key, self.city_center)
                .with_base_url(&self.weather_url)
                .with_timezone(self.timezone)
        })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c.gtfs_dir, PathBuf::from("data/gtfs"));
        assert_eq!(
            c.models.stop_to_stop_path(),
            PathBuf::from("data/models/stop_to_stop/stop_to_stop.json")
        );
        assert_eq!(c.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(c.timezone, chrono_tz::Europe::Dublin);
        assert_eq!(c.fallback_temperature, 283.15);
        assert!(c.weather().is_none());
    }

    #[test]
    fn overrides() {
        let c = config(&[
            ("JT_GTFS_DIR", "/srv/gtfs"),
            ("JT_MODEL_DIR", "/srv/models"),
            ("JT_STOP_TO_STOP_MODEL", "generic_v2.json"),
            ("JT_BIND_ADDR", "0.0.0.0:8080"),
            ("OPENWEATHER_API_KEY", "secret"),
            ("JT_CITY_CENTER_LAT", "51.5"),
            ("JT_TIMEZONE", "Europe/London"),
            ("JT_CATALOG_REFRESH_SECS", "3600"),
        ])
        .unwrap();
        assert_eq!(
            c.models.stop_to_stop_path(),
            PathBuf::from("/srv/models/stop_to_stop/generic_v2.json")
        );
        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.city_center.lat(), 51.5);
        assert_eq!(c.city_center.lon(), Coordinates::DUBLIN_CITY_CENTER.lon());
        assert_eq!(c.catalog_refresh_interval, Duration::from_secs(3600));

        let weather = c.weather().unwrap();
        assert_eq!(weather.api_key, "secret");
        assert_eq!(weather.timezone, chrono_tz::Europe::London);
    }

    #[test]
    fn blank_values_are_unset() {
        let c = config(&[("OPENWEATHER_API_KEY", "  ")]).unwrap();
        assert!(c.weather_api_key.is_none());
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config(&[("JT_BIND_ADDR", "localhost")]).is_err());
        assert!(config(&[("JT_TIMEZONE", "Mars/Olympus")]).is_err());
        assert!(config(&[("JT_CITY_CENTER_LAT", "95")]).is_err());
        assert!(config(&[("JT_FALLBACK_TEMPERATURE", "warm")]).is_err());
        assert!(config(&[("JT_CATALOG_REFRESH_SECS", "0")]).is_err());
    }
}
