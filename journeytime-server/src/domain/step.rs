//! Per-leg prediction types.
//!
//! A [`JourneyPrediction`] bundles what the prediction engine needs for one
//! leg of a suggested itinerary, and carries its result back out.

use chrono::NaiveDateTime;

use super::ids::LineName;
use super::records::Stop;

/// One resolved stop on a requested leg.
#[derive(Debug, Clone, PartialEq)]
pub struct StepStop {
    pub stop: Stop,
    pub sequence: u32,
    /// Cumulative shape distance at this stop, in metres.
    pub shape_dist_traveled: f64,
    /// Shape distance from the leg's first stop, in metres.
    pub dist_from_first_stop_m: f64,
    /// Predicted travel time from the leg's first stop, in seconds.
    pub predicted_time_from_first_stop_s: f64,
}

impl StepStop {
    pub fn new(stop: Stop, sequence: u32, shape_dist_traveled: f64) -> Self {
        Self {
            stop,
            sequence,
            shape_dist_traveled,
            dist_from_first_stop_m: 0.0,
            predicted_time_from_first_stop_s: 0.0,
        }
    }
}

/// Input and output of one leg prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyPrediction {
    pub line: LineName,
    /// Whether a line-specific ("end-to-end") model is listed for `line`.
    pub has_line_model: bool,
    pub planned_duration_s: f64,
    /// Planned departure, in local wall-clock time.
    pub planned_departure: NaiveDateTime,
    /// Resolved stops, in trip order. May be empty.
    pub step_stops: Vec<StepStop>,
    pub predicted_duration_s: f64,
}

impl JourneyPrediction {
    pub fn new(
        line: LineName,
        has_line_model: bool,
        planned_duration_s: f64,
        planned_departure: NaiveDateTime,
        step_stops: Vec<StepStop>,
    ) -> Self {
        Self {
            line,
            has_line_model,
            planned_duration_s,
            planned_departure,
            step_stops,
            predicted_duration_s: 0.0,
        }
    }

    /// Shape distance between the first and last resolved stops, if there
    /// are at least two.
    pub fn total_distance_m(&self) -> Option<f64> {
        match self.step_stops.as_slice() {
            [first, .., last] => Some(last.shape_dist_traveled - first.shape_dist_traveled),
            _ => None,
        }
    }
}

/// Render a duration in seconds as hours and minutes, rounded to the
/// nearest minute.
///
/// # Examples
///
/// ```
/// use journeytime_server::domain::format_duration;
///
/// assert_eq!(format_duration(0.0), "0mins");
/// assert_eq!(format_duration(629.0), "10mins");
/// assert_eq!(format_duration(630.0), "11mins");
/// assert_eq!(format_duration(3_900.0), "1hrs, 5mins");
/// ```
pub fn format_duration(seconds: f64) -> String {
    let total_mins = if seconds.is_finite() && seconds > 0.0 {
        (seconds / 60.0).round() as u64
    } else {
        0
    };
    let (hrs, mins) = (total_mins / 60, total_mins % 60);

    if hrs > 0 {
        format!("{hrs}hrs, {mins}mins")
    } else {
        format!("{mins}mins")
    }
}
