//! The read-only schedule query contract.

use std::collections::BTreeSet;

use crate::domain::{Coordinates, LineName, Route, RouteId, Stop, StopId, StopTimeEntry, Trip, TripId};

/// Read access to a static transit schedule.
///
/// The resolver only ever reads; populating the schedule belongs to the
/// loader. Result orderings are part of the contract so that resolution is
/// deterministic for an unchanged schedule.
pub trait ScheduleStore: Send + Sync {
    /// Look up a stop by id.
    fn stop(&self, id: &StopId) -> Option<&Stop>;

    /// All stops whose name is exactly `name`, ordered by stop id.
    fn stops_named(&self, name: &str) -> Vec<&Stop>;

    /// The stop with the smallest great-circle distance to `point`.
    ///
    /// Ties go to the smallest stop id. `None` only for an empty schedule.
    fn nearest_stop(&self, point: &Coordinates) -> Option<&Stop>;

    /// All routes with the given short name, ordered by route id.
    fn routes_by_short_name(&self, short_name: &LineName) -> Vec<&Route>;

    /// Every distinct route short name in the schedule.
    fn line_names(&self) -> BTreeSet<LineName>;

    /// Look up a trip by id.
    fn trip(&self, id: &TripId) -> Option<&Trip>;

    /// All trips belonging to any of `routes`, ordered by trip id.
    fn trips_for_routes(&self, routes: &[RouteId]) -> Vec<&Trip>;

    /// The stop times of one trip, in increasing sequence order.
    ///
    /// Empty for an unknown trip.
    fn stop_times_for_trip(&self, trip: &TripId) -> &[StopTimeEntry];

    /// Every scheduled visit to `stop`, across all trips.
    fn stop_times_at_stop(&self, stop: &StopId) -> Vec<&StopTimeEntry>;
}
