//! Weather client error types.

/// Errors from the forecast API.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// Request failed before a usable response arrived
    #[error("weather API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Forecast body did not match the expected shape
    #[error("malformed forecast response: {message}{}", body_suffix(body))]
    Json {
        message: String,
        body: Option<String>,
    },

    #[error("weather API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("weather API quota exhausted")]
    RateLimited,

    #[error("weather API rejected the API key")]
    Unauthorized,
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(body) => format!(" (body: {body})"),
        None => String::new(),
    }
}
