//! Feature engineering for the regression artifacts.
//!
//! The trained models expect fixed, named columns. Time fields are encoded
//! cyclically so that neighbouring values across a wraparound (hour 23 and
//! hour 0, December and January) stay numerically close.
//!
//! The periods below are those the artifacts were trained with. The weekday
//! period of 6 applied to ISO weekdays 1..=7 is unusual but must not change
//! without retraining.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Period applied to the ISO weekday (Monday = 1 .. Sunday = 7).
pub const WEEKDAY_PERIOD: f64 = 6.0;
/// Period applied to the hour of day (0..=23).
pub const HOUR_PERIOD: f64 = 23.0;
/// Period applied to the month (1..=12).
pub const MONTH_PERIOD: f64 = 12.0;

/// Column order of the per-line end-to-end artifacts.
pub const END_TO_END_COLUMNS: [&str; 8] = [
    "PLANNED_JOURNEY_TIME",
    "week_sin",
    "week_cos",
    "hour_sin",
    "hour_cos",
    "month_sin",
    "month_cos",
    "temp",
];

/// Column order of the generic stop-to-stop artifact.
pub const STOP_TO_STOP_COLUMNS: [&str; 9] = [
    "PLANNED_JOURNEY_TIME",
    "dis_twostop",
    "dis_prestop_city",
    "dis_stopnow_city",
    "temp",
    "week_sin",
    "week_cos",
    "hour_sin",
    "hour_cos",
];

/// Encode `value` on a cycle of length `period` as `(sin, cos)`.
pub fn cyclical(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

/// Cyclical encodings of a departure timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeFeatures {
    pub week_sin: f64,
    pub week_cos: f64,
    pub hour_sin: f64,
    pub hour_cos: f64,
    pub month_sin: f64,
    pub month_cos: f64,
}

impl TimeFeatures {
    /// Encode a local wall-clock departure.
    pub fn from_departure(departure: &NaiveDateTime) -> Self {
        let week = departure.weekday().number_from_monday() as f64;
        let hour = departure.hour() as f64;
        let month = departure.month() as f64;

        let (week_sin, week_cos) = cyclical(week, WEEKDAY_PERIOD);
        let (hour_sin, hour_cos) = cyclical(hour, HOUR_PERIOD);
        let (month_sin, month_cos) = cyclical(month, MONTH_PERIOD);

        Self {
            week_sin,
            week_cos,
            hour_sin,
            hour_cos,
            month_sin,
            month_cos,
        }
    }
}

/// Inputs describing one stop-to-stop segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentInputs {
    /// Share of the planned leg duration attributed to this segment, in
    /// seconds.
    pub planned_share_s: f64,
    /// Shape distance between the two stops, in metres.
    pub distance_m: f64,
    /// Previous stop's distance from the city center, in km.
    pub prev_from_center_km: f64,
    /// Current stop's distance from the city center, in km.
    pub now_from_center_km: f64,
}

/// An ordered row of named feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: Vec<(&'static str, f64)>,
}

impl FeatureVector {
    fn from_columns(columns: Vec<(&'static str, f64)>) -> Self {
        Self { columns }
    }

    /// Features for a per-line end-to-end model.
    pub fn end_to_end(planned_duration_s: f64, time: &TimeFeatures, temperature: f64) -> Self {
        Self::from_columns(vec![
            ("PLANNED_JOURNEY_TIME", planned_duration_s),
            ("week_sin", time.week_sin),
            ("week_cos", time.week_cos),
            ("hour_sin", time.hour_sin),
            ("hour_cos", time.hour_cos),
            ("month_sin", time.month_sin),
            ("month_cos", time.month_cos),
            ("temp", temperature),
        ])
    }

    /// Features for one segment under the generic stop-to-stop model.
    pub fn stop_to_stop(segment: &SegmentInputs, time: &TimeFeatures, temperature: f64) -> Self {
        Self::from_columns(vec![
            ("PLANNED_JOURNEY_TIME", segment.planned_share_s),
            ("dis_twostop", segment.distance_m),
            ("dis_prestop_city", segment.prev_from_center_km),
            ("dis_stopnow_city", segment.now_from_center_km),
            ("temp", temperature),
            ("week_sin", time.week_sin),
            ("week_cos", time.week_cos),
            ("hour_sin", time.hour_sin),
            ("hour_cos", time.hour_cos),
        ])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(name, _)| *name)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.columns.iter().map(|(_, value)| *value)
    }

    /// Value of a named column.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// True if the column names equal `expected`, in order.
    pub fn has_columns<S: AsRef<str>>(&self, expected: &[S]) -> bool {
        self.columns.len() == expected.len()
            && self
                .names()
                .zip(expected)
                .all(|(have, want)| have == want.as_ref())
    }
}
