//! Domain types for journey time prediction.
//!
//! This module contains the validated value types and schedule records the
//! resolver and prediction engine work with. Value types enforce their
//! invariants at construction time.

mod geo;
mod ids;
mod records;
mod step;
mod time;

pub use geo::{Coordinates, InvalidCoordinates};
pub use ids::{InvalidId, LineName, RouteId, StopId, TripId};
pub use records::{Route, Stop, StopTimeEntry, Trip};
pub use step::{JourneyPrediction, StepStop, format_duration};
pub use time::{ScheduleTime, TimeError};
