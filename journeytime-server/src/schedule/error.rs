//! Schedule loading error types.

use std::path::PathBuf;

use crate::domain::{StopId, TripId};

/// Errors raised while loading or indexing a schedule.
///
/// Queries against a loaded schedule never fail; all validation happens
/// when the schedule is built.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// A schedule file could not be opened
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV row could not be decoded
    #[error("malformed CSV in {file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },

    /// A row decoded but holds an invalid value
    #[error("invalid record in {file} (row {row}): {message}")]
    InvalidRecord {
        file: &'static str,
        row: u64,
        message: String,
    },

    /// A stop time refers to a trip that does not exist
    #[error("stop time refers to unknown trip {0}")]
    UnknownTrip(TripId),

    /// A stop time refers to a stop that does not exist
    #[error("stop time on trip {trip} refers to unknown stop {stop}")]
    UnknownStop { trip: TripId, stop: StopId },

    /// Two stop times on one trip share a sequence number
    #[error("trip {trip} has duplicate stop sequence {sequence}")]
    DuplicateSequence { trip: TripId, sequence: u32 },

    /// Cumulative shape distance goes backwards along a trip
    #[error("trip {trip}: shape distance decreases at sequence {sequence}")]
    ShapeDistanceDecreases { trip: TripId, sequence: u32 },

    /// The schedule has no stops at all
    #[error("schedule contains no stops")]
    Empty,
}
