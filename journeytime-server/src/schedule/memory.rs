//! Indexed in-memory schedule.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::domain::{
    Coordinates, LineName, Route, RouteId, Stop, StopId, StopTimeEntry, Trip, TripId,
};

use super::error::ScheduleError;
use super::store::ScheduleStore;

/// Squared chord lengths closer than this to the best candidate count as a
/// tie and are settled by great-circle distance, then stop id.
const CHORD_TIE_EPSILON: f64 = 1e-15;

/// A stop's unit-sphere position tagged with its index into `stops`.
type StopNode = GeomWithData<[f64; 3], usize>;

/// A schedule held entirely in memory, indexed for the resolver's queries.
///
/// Built once from complete record sets; the constructor validates the
/// invariants the resolver relies on (referential integrity, strictly
/// increasing sequence numbers, non-decreasing shape distance).
pub struct InMemorySchedule {
    /// Sorted by stop id.
    stops: Vec<Stop>,
    stop_index: HashMap<StopId, usize>,
    stop_tree: RTree<StopNode>,
    stops_by_name: HashMap<String, Vec<usize>>,

    /// Sorted by route id.
    routes: Vec<Route>,
    routes_by_short_name: HashMap<LineName, Vec<usize>>,

    trips: HashMap<TripId, Trip>,
    /// Trip ids per route, each list sorted.
    trips_by_route: HashMap<RouteId, Vec<TripId>>,

    /// Stop times per trip, sorted by sequence.
    stop_times: HashMap<TripId, Vec<StopTimeEntry>>,
    /// (trip, index into that trip's stop times) per stop.
    visits_by_stop: HashMap<StopId, Vec<(TripId, usize)>>,
}

impl InMemorySchedule {
    /// Build and validate a schedule from complete record sets.
    pub fn new(
        mut stops: Vec<Stop>,
        mut routes: Vec<Route>,
        trips: Vec<Trip>,
        stop_times: Vec<StopTimeEntry>,
    ) -> Result<Self, ScheduleError> {
        if stops.is_empty() {
            return Err(ScheduleError::Empty);
        }

        stops.sort_by(|a, b| a.id.cmp(&b.id));
        let stop_index: HashMap<StopId, usize> = stops
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();

        let stop_tree = RTree::bulk_load(
            stops
                .iter()
                .enumerate()
                .map(|(i, s)| StopNode::new(s.position.unit_vector(), i))
                .collect(),
        );

        let mut stops_by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, stop) in stops.iter().enumerate() {
            stops_by_name.entry(stop.name.clone()).or_default().push(i);
        }

        routes.sort_by(|a, b| a.id.cmp(&b.id));
        let mut routes_by_short_name: HashMap<LineName, Vec<usize>> = HashMap::new();
        for (i, route) in routes.iter().enumerate() {
            routes_by_short_name
                .entry(route.short_name.clone())
                .or_default()
                .push(i);
        }

        let mut trips_by_route: HashMap<RouteId, Vec<TripId>> = HashMap::new();
        for trip in &trips {
            trips_by_route
                .entry(trip.route_id.clone())
                .or_default()
                .push(trip.id.clone());
        }
        for ids in trips_by_route.values_mut() {
            ids.sort();
        }
        let trips: HashMap<TripId, Trip> = trips.into_iter().map(|t| (t.id.clone(), t)).collect();

        let mut by_trip: HashMap<TripId, Vec<StopTimeEntry>> = HashMap::new();
        for entry in stop_times {
            if !trips.contains_key(&entry.trip_id) {
                return Err(ScheduleError::UnknownTrip(entry.trip_id));
            }
            if !stop_index.contains_key(&entry.stop_id) {
                return Err(ScheduleError::UnknownStop {
                    trip: entry.trip_id,
                    stop: entry.stop_id,
                });
            }
            by_trip.entry(entry.trip_id.clone()).or_default().push(entry);
        }

        let mut visits_by_stop: HashMap<StopId, Vec<(TripId, usize)>> = HashMap::new();
        for (trip_id, entries) in by_trip.iter_mut() {
            entries.sort_by_key(|e| e.sequence);
            validate_trip_order(trip_id, entries)?;
            for (idx, entry) in entries.iter().enumerate() {
                visits_by_stop
                    .entry(entry.stop_id.clone())
                    .or_default()
                    .push((trip_id.clone(), idx));
            }
        }
        for visits in visits_by_stop.values_mut() {
            visits.sort();
        }

        Ok(Self {
            stops,
            stop_index,
            stop_tree,
            stops_by_name,
            routes,
            routes_by_short_name,
            trips,
            trips_by_route,
            stop_times: by_trip,
            visits_by_stop,
        })
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }
}

impl fmt::Debug for InMemorySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySchedule")
            .field("stops", &self.stops.len())
            .field("routes", &self.routes.len())
            .field("trips", &self.trips.len())
            .finish_non_exhaustive()
    }
}

/// Check strictly increasing sequence and non-decreasing shape distance
/// over one trip's entries, which must already be sorted by sequence.
fn validate_trip_order(trip: &TripId, entries: &[StopTimeEntry]) -> Result<(), ScheduleError> {
    for pair in entries.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.sequence == next.sequence {
            return Err(ScheduleError::DuplicateSequence {
                trip: trip.clone(),
                sequence: next.sequence,
            });
        }
        if next.shape_dist_traveled < prev.shape_dist_traveled {
            return Err(ScheduleError::ShapeDistanceDecreases {
                trip: trip.clone(),
                sequence: next.sequence,
            });
        }
    }
    Ok(())
}

impl ScheduleStore for InMemorySchedule {
    fn stop(&self, id: &StopId) -> Option<&Stop> {
        self.stop_index.get(id).map(|&i| &self.stops[i])
    }

    fn stops_named(&self, name: &str) -> Vec<&Stop> {
        self.stops_by_name
            .get(name)
            .map(|idxs| idxs.iter().map(|&i| &self.stops[i]).collect())
            .unwrap_or_default()
    }

    fn nearest_stop(&self, point: &Coordinates) -> Option<&Stop> {
        let target = point.unit_vector();
        let mut nearest = self.stop_tree.nearest_neighbor_iter_with_distance_2(&target);
        let (first, best) = nearest.next()?;
        let ties = nearest
            .take_while(|(_, d2)| *d2 <= best + CHORD_TIE_EPSILON)
            .map(|(node, _)| node);

        std::iter::once(first)
            .chain(ties)
            .map(|node| &self.stops[node.data])
            .min_by(|a, b| {
                a.position
                    .distance_m(point)
                    .total_cmp(&b.position.distance_m(point))
                    .then_with(|| a.id.cmp(&b.id))
            })
    }

    fn routes_by_short_name(&self, short_name: &LineName) -> Vec<&Route> {
        self.routes_by_short_name
            .get(short_name)
            .map(|idxs| idxs.iter().map(|&i| &self.routes[i]).collect())
            .unwrap_or_default()
    }

    fn line_names(&self) -> BTreeSet<LineName> {
        self.routes_by_short_name.keys().cloned().collect()
    }

    fn trip(&self, id: &TripId) -> Option<&Trip> {
        self.trips.get(id)
    }

    fn trips_for_routes(&self, routes: &[RouteId]) -> Vec<&Trip> {
        let mut ids: Vec<&TripId> = routes
            .iter()
            .filter_map(|r| self.trips_by_route.get(r))
            .flatten()
            .collect();
        ids.sort();
        ids.dedup();
        ids.into_iter().filter_map(|id| self.trips.get(id)).collect()
    }

    fn stop_times_for_trip(&self, trip: &TripId) -> &[StopTimeEntry] {
        self.stop_times
            .get(trip)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn stop_times_at_stop(&self, stop: &StopId) -> Vec<&StopTimeEntry> {
        self.visits_by_stop
            .get(stop)
            .map(|visits| {
                visits
                    .iter()
                    .filter_map(|(trip, idx)| self.stop_times.get(trip)?.get(*idx))
                    .collect()
            })
            .unwrap_or_default()
    }
}
