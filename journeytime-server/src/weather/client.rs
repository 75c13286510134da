//! OpenWeather forecast HTTP client.

use chrono_tz::Tz;

use crate::domain::Coordinates;

use super::error::WeatherError;
use super::types::Forecast;

/// Default forecast endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Configuration for the weather client.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// API key, sent as the `appid` query parameter
    pub api_key: String,
    /// Forecast endpoint URL
    pub base_url: String,
    /// Reference location the forecast is requested for
    pub location: Coordinates,
    /// Zone in which forecast slots are turned into local hours
    pub timezone: Tz,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl WeatherConfig {
    /// Create a new config with the given API key and reference location.
    pub fn new(api_key: impl Into<String>, location: Coordinates) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            location,
            timezone: chrono_tz::Europe::Dublin,
            timeout_secs: 10,
        }
    }

    /// Set a custom endpoint URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Forecast API client for one fixed location.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    config: WeatherConfig,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    pub fn timezone(&self) -> Tz {
        self.config.timezone
    }

    /// Fetch the hourly forecast for the configured location.
    pub async fn fetch_forecast(&self) -> Result<Forecast, WeatherError> {
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("lat", self.config.location.lat().to_string()),
                ("lon", self.config.location.lon().to_string()),
                ("appid", self.config.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(WeatherError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(WeatherError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| WeatherError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builders() {
        let center = Coordinates::new(53.347269, -6.259107).unwrap();
        let config = WeatherConfig::new("key", center)
            .with_base_url("http://localhost:9999/forecast")
            .with_timezone(chrono_tz::UTC)
            .with_timeout(2);

        assert_eq!(config.base_url, "http://localhost:9999/forecast");
        assert_eq!(config.timezone, chrono_tz::UTC);
        assert_eq!(config.timeout_secs, 2);

        let client = WeatherClient::new(config).unwrap();
        assert_eq!(client.timezone(), chrono_tz::UTC);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_error() {
        let center = Coordinates::new(53.347269, -6.259107).unwrap();
        let config = WeatherConfig::new("key", center)
            .with_base_url("http://127.0.0.1:1/forecast")
            .with_timeout(2);
        let client = WeatherClient::new(config).unwrap();

        let err = client.fetch_forecast().await.unwrap_err();
        assert!(matches!(err, WeatherError::Http(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("weather API request failed"));
    }
}
