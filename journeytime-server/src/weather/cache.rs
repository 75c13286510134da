//! Caching layer for forecast responses.
//!
//! The forecast for the reference location changes slowly, so one cached
//! response serves every prediction until the TTL expires.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use super::client::WeatherClient;
use super::error::WeatherError;
use super::types::Forecast;

/// Configuration for the forecast cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for the cached forecast.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
        }
    }
}

/// Weather client with caching.
///
/// Wraps a `WeatherClient` and caches its single forecast response.
pub struct CachedWeatherClient {
    client: WeatherClient,
    forecasts: MokaCache<(), Arc<Forecast>>,
}

impl CachedWeatherClient {
    pub fn new(client: WeatherClient, config: &CacheConfig) -> Self {
        let forecasts = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(1)
            .build();

        Self { client, forecasts }
    }

    pub fn client(&self) -> &WeatherClient {
        &self.client
    }

    /// Get the forecast, using the cache if available.
    pub async fn forecast(&self) -> Result<Arc<Forecast>, WeatherError> {
        if let Some(cached) = self.forecasts.get(&()).await {
            return Ok(cached);
        }

        let forecast = Arc::new(self.client.fetch_forecast().await?);
        self.forecasts.insert((), Arc::clone(&forecast)).await;

        Ok(forecast)
    }
}
