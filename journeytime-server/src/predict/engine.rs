//! Duration prediction over a resolved stop sequence.
//!
//! Two strategies exist. With a per-line model the whole leg is predicted at
//! once and the total is spread over the stops by distance. Otherwise the
//! generic model predicts each stop-to-stop segment and the segment
//! predictions are summed.

use std::sync::Arc;

use chrono::Timelike;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::JourneyPrediction;
use crate::features::{FeatureVector, SegmentInputs, TimeFeatures};
use crate::inference::{ModelError, ModelRegistry, Regressor};

/// Which model produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// A per-line model predicted the whole leg.
    EndToEnd,
    /// The generic model predicted each segment.
    StopToStop,
}

/// Runs the prediction strategies against the model registry.
#[derive(Clone)]
pub struct PredictionEngine {
    models: Arc<ModelRegistry>,
}

impl PredictionEngine {
    pub fn new(models: Arc<ModelRegistry>) -> Self {
        Self { models }
    }

    /// Fill in the predicted durations of `prediction`.
    ///
    /// The end-to-end strategy is used when `prediction.has_line_model` is
    /// set and the line's model loads and runs. Any failure on that path is
    /// logged and the stop-to-stop strategy is used instead. Errors from the
    /// generic model are returned.
    pub async fn predict(
        &self,
        prediction: &mut JourneyPrediction,
        temperature: f64,
    ) -> Result<Strategy, ModelError> {
        let time = TimeFeatures::from_departure(&prediction.planned_departure);
        debug!(
            line = %prediction.line,
            hour = prediction.planned_departure.hour(),
            temperature,
            stops = prediction.step_stops.len(),
            "predicting leg"
        );

        if prediction.has_line_model {
            match self.models.line_model(&prediction.line).await {
                Ok(Some(model)) => {
                    match predict_end_to_end(model.as_ref(), prediction, &time, temperature) {
                        Ok(()) => return Ok(Strategy::EndToEnd),
                        Err(e) => warn!(
                            line = %prediction.line,
                            error = %e,
                            "end-to-end model failed, falling back to stop-to-stop"
                        ),
                    }
                }
                Ok(None) => warn!(
                    line = %prediction.line,
                    "end-to-end model listed but missing, falling back to stop-to-stop"
                ),
                Err(e) => warn!(
                    line = %prediction.line,
                    error = %e,
                    "end-to-end model unusable, falling back to stop-to-stop"
                ),
            }
        }

        predict_stop_to_stop(self.models.generic().as_ref(), prediction, &time, temperature)?;
        Ok(Strategy::StopToStop)
    }
}

/// Predict the whole leg with one call to a per-line model, then spread the
/// total over the stops in proportion to shape distance.
///
/// Nothing is spread when there are fewer than two stops or they span no
/// distance. `prediction` is left unchanged on error.
pub fn predict_end_to_end(
    model: &dyn Regressor,
    prediction: &mut JourneyPrediction,
    time: &TimeFeatures,
    temperature: f64,
) -> Result<(), ModelError> {
    let features = FeatureVector::end_to_end(prediction.planned_duration_s, time, temperature);
    let total = model.predict(&features)?;
    debug!(line = %prediction.line, total, "end-to-end prediction");
    prediction.predicted_duration_s = total;

    let Some(total_dist) = prediction.total_distance_m().filter(|d| *d > 0.0) else {
        return Ok(());
    };

    let start = prediction.step_stops[0].shape_dist_traveled;
    let mut cumulative = 0.0;
    let mut prev = start;
    for stop in prediction.step_stops.iter_mut() {
        let segment = stop.shape_dist_traveled - prev;
        cumulative += total * (segment / total_dist);
        stop.dist_from_first_stop_m = stop.shape_dist_traveled - start;
        stop.predicted_time_from_first_stop_s = cumulative;
        prev = stop.shape_dist_traveled;
    }
    Ok(())
}

/// Predict each consecutive stop pair with the generic model and sum.
///
/// Each segment is given a share of the planned leg duration proportional
/// to its distance, or an equal share when the stops span no distance.
/// With fewer than two stops nothing is predicted. `prediction` is left
/// unchanged on error.
pub fn predict_stop_to_stop(
    model: &dyn Regressor,
    prediction: &mut JourneyPrediction,
    time: &TimeFeatures,
    temperature: f64,
) -> Result<(), ModelError> {
    let stops = &prediction.step_stops;
    if stops.len() < 2 {
        warn!(line = %prediction.line, "no stop-by-stop breakdown, nothing to predict");
        return Ok(());
    }

    let segments = stops.len() - 1;
    let total_dist = prediction.total_distance_m().unwrap_or(0.0);
    let start = stops[0].shape_dist_traveled;

    let mut cumulative = Vec::with_capacity(segments);
    let mut total = 0.0;
    for pair in stops.windows(2) {
        let (prev, now) = (&pair[0], &pair[1]);
        let distance = now.shape_dist_traveled - prev.shape_dist_traveled;
        let share = if total_dist > 0.0 {
            distance / total_dist
        } else {
            1.0 / segments as f64
        };
        let segment = SegmentInputs {
            planned_share_s: prediction.planned_duration_s * share,
            distance_m: distance,
            prev_from_center_km: prev.stop.dist_from_center_km,
            now_from_center_km: now.stop.dist_from_center_km,
        };
        let seconds = model.predict(&FeatureVector::stop_to_stop(&segment, time, temperature))?;
        total += seconds;
        cumulative.push(total);
    }

    for (stop, elapsed) in prediction.step_stops.iter_mut().skip(1).zip(cumulative) {
        stop.dist_from_first_stop_m = stop.shape_dist_traveled - start;
        stop.predicted_time_from_first_stop_s = elapsed;
    }
    debug!(line = %prediction.line, total, segments, "stop-to-stop prediction");
    prediction.predicted_duration_s = total;
    Ok(())
}
