//! Application state for the web layer.

use std::sync::Arc;

use chrono_tz::Tz;

use crate::predict::LegPredictor;
use crate::weather::Weather;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Resolution and prediction for a single leg
    pub predictor: Arc<LegPredictor<Weather>>,

    /// Zone epoch departure times are read in
    pub timezone: Tz,
}

impl AppState {
    /// Create a new app state.
    pub fn new(predictor: LegPredictor<Weather>, timezone: Tz) -> Self {
        Self {
            predictor: Arc::new(predictor),
            timezone,
        }
    }
}
