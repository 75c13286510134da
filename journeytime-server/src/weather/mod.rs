//! Weather covariate for the prediction models.
//!
//! The models take the forecast temperature at the departure hour. A live
//! source calls the OpenWeather forecast API for a fixed reference location;
//! a fixed source stands in when no API key is configured.

mod cache;
mod client;
mod error;
mod types;

use std::future::Future;

use tracing::warn;

pub use cache::{CacheConfig, CachedWeatherClient};
pub use client::{DEFAULT_BASE_URL, WeatherClient, WeatherConfig};
pub use error::WeatherError;
pub use types::{Forecast, ForecastEntry, MainReadings};

/// Temperature in Kelvin used when no forecast reading is available.
pub const DEFAULT_FALLBACK_TEMPERATURE: f64 = 283.15;

/// Trait for sources of hourly temperature readings.
pub trait WeatherSource: Send + Sync {
    /// Forecast temperature for a local hour of day, or `None` if the
    /// forecast does not cover that hour.
    fn temperature_at_hour(
        &self,
        hour: u32,
    ) -> impl Future<Output = Result<Option<f64>, WeatherError>> + Send;
}

impl WeatherSource for CachedWeatherClient {
    async fn temperature_at_hour(&self, hour: u32) -> Result<Option<f64>, WeatherError> {
        let forecast = self.forecast().await?;
        Ok(forecast.temperature_at_hour(hour, self.client().timezone()))
    }
}

/// A source reporting the same temperature for every hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWeather {
    pub temperature: f64,
}

impl WeatherSource for FixedWeather {
    async fn temperature_at_hour(&self, _hour: u32) -> Result<Option<f64>, WeatherError> {
        Ok(Some(self.temperature))
    }
}

/// The weather source the service runs with.
pub enum Weather {
    Live(CachedWeatherClient),
    Fixed(FixedWeather),
}

impl WeatherSource for Weather {
    async fn temperature_at_hour(&self, hour: u32) -> Result<Option<f64>, WeatherError> {
        match self {
            Weather::Live(client) => client.temperature_at_hour(hour).await,
            Weather::Fixed(fixed) => fixed.temperature_at_hour(hour).await,
        }
    }
}

/// Look up the temperature for `hour`, substituting `fallback` when the
/// source fails or has no reading for that hour.
pub async fn temperature_or_fallback<W>(source: &W, hour: u32, fallback: f64) -> f64
where
    W: WeatherSource,
{
    match source.temperature_at_hour(hour).await {
        Ok(Some(temp)) => temp,
        Ok(None) => {
            warn!(hour, fallback, "no forecast for hour, using fallback temperature");
            fallback
        }
        Err(e) => {
            warn!(error = %e, fallback, "weather lookup failed, using fallback temperature");
            fallback
        }
    }
}
