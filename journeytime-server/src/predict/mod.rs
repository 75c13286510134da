//! Leg prediction.
//!
//! [`LegPredictor`] takes one validated leg through line support checks,
//! trip resolution, weather lookup and the [`PredictionEngine`], producing a
//! [`LegOutcome`]. Legs are independent: a failure on one never affects
//! another.

mod engine;
mod leg;

use std::sync::Arc;

use chrono::Timelike;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::domain::{JourneyPrediction, ScheduleTime};
use crate::resolve::{LegQuery, Resolution, ResolveError, TripResolver};
use crate::weather::{WeatherSource, temperature_or_fallback};

pub use engine::{PredictionEngine, Strategy, predict_end_to_end, predict_stop_to_stop};
pub use leg::{
    DepartureTime, LegOutcome, LegRequest, LegRequestError, STATUS_ATTEMPTED,
    STATUS_NO_STOP_DETAIL,
};

/// Everything needed to predict one leg.
pub struct LegPredictor<W> {
    resolver: TripResolver,
    engine: PredictionEngine,
    catalog: Catalog,
    weather: Arc<W>,
    fallback_temperature: f64,
}

impl<W: WeatherSource> LegPredictor<W> {
    pub fn new(
        resolver: TripResolver,
        engine: PredictionEngine,
        catalog: Catalog,
        weather: Arc<W>,
        fallback_temperature: f64,
    ) -> Self {
        Self {
            resolver,
            engine,
            catalog,
            weather,
            fallback_temperature,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve a leg's stop sequence without predicting.
    pub fn resolve(&self, request: &LegRequest) -> Result<Resolution, ResolveError> {
        self.resolver.resolve(&query_for(request))
    }

    /// Predict one leg.
    pub async fn predict(&self, request: &LegRequest) -> LegOutcome {
        let catalog = self.catalog.snapshot().await;
        if !catalog.is_valid(&request.line) {
            info!(line = %request.line, "prediction requested for unknown line");
            return LegOutcome::Unsupported {
                line: request.line.clone(),
            };
        }

        let resolution = match self.resolve(request) {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(line = %request.line, error = %e, "leg resolution failed");
                return LegOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let mut prediction = JourneyPrediction::new(
            request.line.clone(),
            catalog.has_model(&request.line),
            request.planned_duration_s,
            request.departure_time,
            resolution.stops,
        );

        let temperature = temperature_or_fallback(
            self.weather.as_ref(),
            request.departure_time.hour(),
            self.fallback_temperature,
        )
        .await;

        match self.engine.predict(&mut prediction, temperature).await {
            Ok(strategy) => {
                info!(
                    line = %request.line,
                    ?strategy,
                    planned = request.planned_duration_s,
                    predicted = prediction.predicted_duration_s,
                    stops = prediction.step_stops.len(),
                    "leg predicted"
                );
                LegOutcome::Predicted {
                    prediction,
                    strategy,
                }
            }
            Err(e) => {
                warn!(line = %request.line, error = %e, "stop-to-stop model failed");
                LegOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn query_for(request: &LegRequest) -> LegQuery {
    LegQuery {
        line: request.line.clone(),
        long_name: request.long_name.clone(),
        headsign: request.headsign.clone(),
        cutoff: ScheduleTime::from_time_of_day(request.departure_time.time()),
        departure: request.departure.clone(),
        arrival: request.arrival.clone(),
    }
}
