//! Trip resolution.
//!
//! Turns an externally sourced leg description (line, stops, headsign and a
//! departure time) into the stop sequence of one concrete scheduled trip.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Coordinates, LineName, ScheduleTime, StepStop, StopId, StopTimeEntry, TripId};
use crate::schedule::ScheduleStore;

use super::error::ResolveError;
use super::route_matcher::{MatchConfidence, match_routes};
use super::stop_matcher::{StopMatchMethod, match_stop};

/// An asserted stop: the name and position the routing source reported.
#[derive(Debug, Clone, PartialEq)]
pub struct StopDescriptor {
    pub name: String,
    pub position: Coordinates,
}

impl StopDescriptor {
    pub fn new(name: impl Into<String>, position: Coordinates) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// One leg to resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct LegQuery {
    pub line: LineName,
    /// Full line name as reported by the routing source, if any.
    pub long_name: Option<String>,
    pub headsign: Option<String>,
    /// Local time-of-day of the reported departure.
    pub cutoff: ScheduleTime,
    pub departure: StopDescriptor,
    pub arrival: StopDescriptor,
}

/// The outcome of resolving one leg.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub departure_stop: StopId,
    pub departure_method: StopMatchMethod,
    pub arrival_stop: StopId,
    pub arrival_method: StopMatchMethod,
    pub route_confidence: MatchConfidence,
    /// The selected trip, if any survived selection.
    pub trip: Option<TripId>,
    /// Stops from departure to arrival inclusive, in trip order. Empty when
    /// no trip was selected.
    pub stops: Vec<StepStop>,
}

/// Resolves legs against a schedule.
#[derive(Clone)]
pub struct TripResolver {
    schedule: Arc<dyn ScheduleStore>,
}

impl TripResolver {
    pub fn new(schedule: Arc<dyn ScheduleStore>) -> Self {
        Self { schedule }
    }

    /// Resolve a leg to the stop sequence of its most probable trip.
    ///
    /// The selected trip is the one whose scheduled arrival at the departure
    /// stop is the latest not after `query.cutoff`, restricted to the
    /// matched routes and, when given, the headsign. When the routes were
    /// matched by line number only, trips that do not visit the departure
    /// stop before the arrival stop are discarded first.
    pub fn resolve(&self, query: &LegQuery) -> Result<Resolution, ResolveError> {
        let store = self.schedule.as_ref();
        debug!(line = %query.line, cutoff = %query.cutoff, "resolving leg");

        let dep = match_stop(store, &query.departure.name, &query.departure.position)?;
        let arr = match_stop(store, &query.arrival.name, &query.arrival.position)?;

        let routes = match_routes(store, &query.line, query.long_name.as_deref());
        let mut candidates: Vec<TripId> = store
            .trips_for_routes(&routes.routes)
            .into_iter()
            .map(|t| t.id.clone())
            .collect();
        debug!(trips = candidates.len(), "candidate trips for routes");

        if routes.is_ambiguous() {
            candidates.retain(|trip| {
                visits_in_order(store.stop_times_for_trip(trip), &dep.stop.id, &arr.stop.id)
            });
            debug!(
                trips = candidates.len(),
                "trips remaining after direction filter"
            );
        }

        let candidates: BTreeSet<TripId> = candidates.into_iter().collect();
        let trip = select_trip(
            store,
            &candidates,
            &dep.stop.id,
            query.headsign.as_deref(),
            query.cutoff,
        );

        let stops = match &trip {
            Some(trip_id) => {
                debug!(trip = %trip_id, "most likely trip identified");
                let stops = slice_trip(store, trip_id, &dep.stop.id, &arr.stop.id);
                if stops.is_empty() {
                    warn!(
                        trip = %trip_id,
                        arrival = %arr.stop.id,
                        "arrival stop not reached after departure on selected trip"
                    );
                }
                stops
            }
            None => {
                debug!(line = %query.line, "no trip found for leg");
                Vec::new()
            }
        };

        Ok(Resolution {
            departure_stop: dep.stop.id.clone(),
            departure_method: dep.method,
            arrival_stop: arr.stop.id.clone(),
            arrival_method: arr.method,
            route_confidence: routes.confidence,
            trip,
            stops,
        })
    }
}

/// Whether `entries` visit `dep` strictly before some later visit to `arr`.
fn visits_in_order(entries: &[StopTimeEntry], dep: &StopId, arr: &StopId) -> bool {
    entries
        .iter()
        .position(|e| &e.stop_id == dep)
        .is_some_and(|i| entries[i + 1..].iter().any(|e| &e.stop_id == arr))
}

/// Pick the visit to `dep` with the latest arrival not after `cutoff`.
///
/// Ties on arrival time go to the smallest trip id.
fn select_trip(
    store: &dyn ScheduleStore,
    candidates: &BTreeSet<TripId>,
    dep: &StopId,
    headsign: Option<&str>,
    cutoff: ScheduleTime,
) -> Option<TripId> {
    let headsign = headsign.map(str::trim).filter(|h| !h.is_empty());

    store
        .stop_times_at_stop(dep)
        .into_iter()
        .filter(|e| candidates.contains(&e.trip_id))
        .filter(|e| e.arrival <= cutoff)
        .filter(|e| match headsign {
            None => true,
            Some(wanted) => store
                .trip(&e.trip_id)
                .is_some_and(|trip| e.effective_headsign(trip).trim_end() == wanted),
        })
        .max_by(|a, b| {
            a.arrival
                .cmp(&b.arrival)
                .then_with(|| b.trip_id.cmp(&a.trip_id))
        })
        .map(|e| e.trip_id.clone())
}

/// The contiguous run of `trip` from the first visit to `dep` through the
/// first visit to `arr` at or after it.
///
/// Empty if either stop is missing from that range.
fn slice_trip(
    store: &dyn ScheduleStore,
    trip: &TripId,
    dep: &StopId,
    arr: &StopId,
) -> Vec<StepStop> {
    let entries = store.stop_times_for_trip(trip);
    let Some(start) = entries.iter().position(|e| &e.stop_id == dep) else {
        return Vec::new();
    };
    let Some(len) = entries[start..].iter().position(|e| &e.stop_id == arr) else {
        return Vec::new();
    };

    let run = &entries[start..=start + len];
    let origin = run[0].shape_dist_traveled;
    run.iter()
        .filter_map(|e| {
            let stop = store.stop(&e.stop_id)?;
            let mut step = StepStop::new(stop.clone(), e.sequence, e.shape_dist_traveled);
            step.dist_from_first_stop_m = e.shape_dist_traveled - origin;
            Some(step)
        })
        .collect()
}
