//! Schedule record types.
//!
//! These mirror the GTFS tables the resolver reads. They are created by the
//! schedule loader and are read-only everywhere else.

use serde::Serialize;

use super::geo::Coordinates;
use super::ids::{LineName, RouteId, StopId, TripId};
use super::time::ScheduleTime;

/// A physical transit stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub position: Coordinates,
    /// Great-circle distance from the configured city center, in km.
    pub dist_from_center_km: f64,
}

/// A published line. `short_name` is not unique across routes.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: RouteId,
    pub short_name: LineName,
    pub long_name: String,
    pub agency_id: String,
}

/// One scheduled run of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: TripId,
    pub route_id: RouteId,
    pub service_id: String,
    pub shape_id: Option<String>,
    pub headsign: String,
    /// GTFS `direction_id` (0 or 1), when the feed provides one.
    pub direction: Option<u8>,
}

/// One stop visit within a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct StopTimeEntry {
    pub trip_id: TripId,
    pub stop_id: StopId,
    pub sequence: u32,
    pub arrival: ScheduleTime,
    pub departure: ScheduleTime,
    /// Per-visit headsign. Empty when the feed only sets a trip headsign.
    pub headsign: String,
    /// Cumulative distance along the trip's shape, in metres.
    pub shape_dist_traveled: f64,
}

impl StopTimeEntry {
    /// The headsign shown at this visit: the entry's own if set, else the
    /// trip's. Leading whitespace present in some feeds is dropped.
    pub fn effective_headsign<'a>(&'a self, trip: &'a Trip) -> &'a str {
        let own = self.headsign.trim_start();
        if own.is_empty() {
            trip.headsign.trim_start()
        } else {
            own
        }
    }
}
