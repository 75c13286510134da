//! Per-leg requests and outcomes.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::{
    InvalidCoordinates, InvalidId, JourneyPrediction, LineName, format_duration,
};
use crate::resolve::StopDescriptor;

use super::engine::Strategy;

/// Status for a prediction with a stop-by-stop breakdown.
pub const STATUS_ATTEMPTED: &str = "Prediction Attempted";
/// Status for a prediction without a stop-by-stop breakdown.
pub const STATUS_NO_STOP_DETAIL: &str =
    "Prediction Attempted - Stop-by-Stop information not available.";

/// Why a leg description could not be turned into a [`LegRequest`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LegRequestError {
    #[error("missing line identifier")]
    MissingLine,

    #[error("invalid line identifier: {0}")]
    InvalidLine(#[from] InvalidId),

    #[error("missing departure time")]
    MissingDepartureTime,

    #[error("invalid departure time {value:?}: {reason}")]
    InvalidDepartureTime { value: String, reason: String },

    #[error("missing {0} stop")]
    MissingStop(&'static str),

    #[error("invalid {which} stop location: {source}")]
    InvalidStopLocation {
        which: &'static str,
        #[source]
        source: InvalidCoordinates,
    },

    #[error("missing planned duration")]
    MissingDuration,

    #[error("invalid planned duration {0}")]
    InvalidDuration(f64),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// A departure timestamp as the routing source sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DepartureTime {
    /// Unix seconds, possibly fractional.
    Epoch(f64),
    /// Local wall-clock time, e.g. `2022-07-15T16:44:03.000GMT+0100`.
    Text(String),
}

impl DepartureTime {
    /// Local wall-clock time of the departure.
    ///
    /// Epoch seconds are converted in `tz`, keeping any fraction of a
    /// second. Text has everything from its
    /// last `.` onwards dropped (fractional seconds and zone suffix) and is
    /// read as `%Y-%m-%dT%H:%M:%S`.
    pub fn to_local(&self, tz: Tz) -> Result<NaiveDateTime, LegRequestError> {
        match self {
            DepartureTime::Epoch(secs) => epoch_to_utc(*secs)
                .map(|t| t.with_timezone(&tz).naive_local())
                .ok_or_else(|| LegRequestError::InvalidDepartureTime {
                    value: secs.to_string(),
                    reason: "out of range".to_string(),
                }),
            DepartureTime::Text(text) => {
                let trimmed = text.trim();
                let stem = trimmed.rsplit_once('.').map_or(trimmed, |(head, _)| head);
                NaiveDateTime::parse_from_str(stem, "%Y-%m-%dT%H:%M:%S").map_err(|e| {
                    LegRequestError::InvalidDepartureTime {
                        value: text.clone(),
                        reason: e.to_string(),
                    }
                })
            }
        }
    }
}

fn epoch_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// A validated leg, ready for resolution and prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct LegRequest {
    pub line: LineName,
    pub long_name: Option<String>,
    pub headsign: Option<String>,
    pub planned_duration_s: f64,
    /// Local wall-clock departure.
    pub departure_time: NaiveDateTime,
    pub departure: StopDescriptor,
    pub arrival: StopDescriptor,
}

impl LegRequest {
    /// Check a planned duration is usable.
    pub fn validate_duration(seconds: f64) -> Result<f64, LegRequestError> {
        if seconds.is_finite() && seconds >= 0.0 {
            Ok(seconds)
        } else {
            Err(LegRequestError::InvalidDuration(seconds))
        }
    }
}

/// The result of handling one leg.
#[derive(Debug, Clone, PartialEq)]
pub enum LegOutcome {
    /// A prediction was made. Its stop list may be empty if no trip was
    /// resolved.
    Predicted {
        prediction: JourneyPrediction,
        strategy: Strategy,
    },
    /// The schedule does not know this line.
    Unsupported { line: LineName },
    /// The leg description was incomplete or malformed.
    InvalidRequest { reason: String },
    /// Resolution or the generic model failed.
    Failed { reason: String },
}

impl LegOutcome {
    pub fn invalid(err: &LegRequestError) -> Self {
        LegOutcome::InvalidRequest {
            reason: err.to_string(),
        }
    }

    /// Human-readable status shown alongside the leg.
    pub fn status(&self) -> String {
        match self {
            LegOutcome::Predicted { prediction, .. } if prediction.step_stops.is_empty() => {
                STATUS_NO_STOP_DETAIL.to_string()
            }
            LegOutcome::Predicted { .. } => STATUS_ATTEMPTED.to_string(),
            LegOutcome::Unsupported { line } => {
                format!("Prediction Service not available for route '{line}'.")
            }
            LegOutcome::InvalidRequest { reason } => {
                format!("Prediction not attempted - {reason}")
            }
            LegOutcome::Failed { reason } => format!("Prediction failed - {reason}"),
        }
    }

    /// True for a prediction made without a stop-by-stop breakdown.
    pub fn is_degraded(&self) -> bool {
        matches!(self, LegOutcome::Predicted { prediction, .. } if prediction.step_stops.is_empty())
    }

    pub fn prediction(&self) -> Option<&JourneyPrediction> {
        match self {
            LegOutcome::Predicted { prediction, .. } => Some(prediction),
            _ => None,
        }
    }

    /// Predicted duration as `(text, seconds)`, if a prediction was made.
    pub fn predicted_duration(&self) -> Option<(String, f64)> {
        self.prediction().map(|p| {
            (
                format_duration(p.predicted_duration_s),
                p.predicted_duration_s,
            )
        })
    }
}
