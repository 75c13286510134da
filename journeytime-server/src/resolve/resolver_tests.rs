//! Scenario tests for trip resolution on a slice of Dublin route 15.

use std::sync::Arc;

use super::*;
use crate::domain::{
    Coordinates, LineName, Route, RouteId, ScheduleTime, Stop, StopId, StopTimeEntry, Trip, TripId,
};
use crate::fixtures::{ROUTE_15_LONG_NAME, coords, dublin, outbound, route, trip};
use crate::schedule::{InMemorySchedule, ScheduleStore};

fn resolver() -> TripResolver {
    TripResolver::new(Arc::new(dublin()))
}

/// The route 15 leg from Eden Quay to Connolly, departing 16:44:03.
fn route_15_query(long_name: &str) -> LegQuery {
    LegQuery {
        line: LineName::parse("15").unwrap(),
        long_name: Some(long_name.to_string()),
        headsign: Some("Clongriffin".to_string()),
        cutoff: ScheduleTime::parse("16:44:03").unwrap(),
        departure: StopDescriptor::new("Eden Quay, stop 299", coords(53.3482354, -6.2561569)),
        arrival: StopDescriptor::new("Connolly", coords(53.3505441, -6.2507091)),
    }
}

fn stop_names(resolution: &Resolution) -> Vec<&str> {
    resolution
        .stops
        .iter()
        .map(|s| s.stop.name.as_str())
        .collect()
}

#[test]
fn exact_route_match_resolves_two_stops() {
    let resolution = resolver().resolve(&route_15_query(ROUTE_15_LONG_NAME)).unwrap();

    assert_eq!(resolution.route_confidence, MatchConfidence::Exact);
    assert_eq!(
        resolution.trip,
        Some(TripId::parse("t15-out-1635").unwrap())
    );
    assert_eq!(
        stop_names(&resolution),
        vec!["Eden Quay, stop 299", "Connolly, stop 497"]
    );
}

#[test]
fn altered_long_name_resolves_same_stops() {
    let resolution = resolver()
        .resolve(&route_15_query(
            "this-name-has-been-altered-to-force-poor-match",
        ))
        .unwrap();

    assert_eq!(resolution.route_confidence, MatchConfidence::ShortNameOnly);
    assert_eq!(
        stop_names(&resolution),
        vec!["Eden Quay, stop 299", "Connolly, stop 497"]
    );
}

#[test]
fn direction_filter_discards_reverse_trip_without_headsign() {
    let mut query = route_15_query("altered");
    query.headsign = None;

    let resolution = resolver().resolve(&query).unwrap();

    // The inbound trip calls at Eden Quay at 16:41, later than the outbound
    // 16:35, but visits Connolly first.
    assert_eq!(
        resolution.trip,
        Some(TripId::parse("t15-out-1635").unwrap())
    );
    assert_eq!(resolution.stops.len(), 2);
}

#[test]
fn stop_matching_methods_are_reported() {
    let resolution = resolver().resolve(&route_15_query(ROUTE_15_LONG_NAME)).unwrap();
    assert_eq!(resolution.departure_method, StopMatchMethod::Name);
    assert_eq!(resolution.arrival_method, StopMatchMethod::Proximity);
    assert_eq!(resolution.arrival_stop.as_str(), "8220DB000497");
}

#[test]
fn distances_are_measured_from_first_stop() {
    let resolution = resolver().resolve(&route_15_query(ROUTE_15_LONG_NAME)).unwrap();
    let stops = &resolution.stops;

    assert_eq!(stops[0].shape_dist_traveled, 350.0);
    assert_eq!(stops[0].dist_from_first_stop_m, 0.0);
    assert_eq!(stops[1].dist_from_first_stop_m, 450.0);
    assert_eq!(stops[0].sequence, 2);
    assert_eq!(stops[1].sequence, 3);
}

#[test]
fn resolution_is_deterministic() {
    let resolver = resolver();
    let query = route_15_query("altered");
    let first = resolver.resolve(&query).unwrap();
    let second = resolver.resolve(&query).unwrap();
    assert_eq!(first, second);
}

#[test]
fn earlier_departure_selected_over_later() {
    let mut query = route_15_query(ROUTE_15_LONG_NAME);
    query.cutoff = ScheduleTime::parse("12:00:00").unwrap();

    let resolution = resolver().resolve(&query).unwrap();
    assert_eq!(
        resolution.trip,
        Some(TripId::parse("t15-out-0830").unwrap())
    );
}

#[test]
fn cutoff_is_inclusive() {
    let mut query = route_15_query(ROUTE_15_LONG_NAME);
    query.cutoff = ScheduleTime::parse("16:50:00").unwrap();

    let resolution = resolver().resolve(&query).unwrap();
    assert_eq!(
        resolution.trip,
        Some(TripId::parse("t15-out-1650").unwrap())
    );
}

#[test]
fn nothing_before_cutoff_gives_empty_stops() {
    let mut query = route_15_query(ROUTE_15_LONG_NAME);
    query.cutoff = ScheduleTime::parse("06:00:00").unwrap();

    let resolution = resolver().resolve(&query).unwrap();
    assert_eq!(resolution.trip, None);
    assert!(resolution.stops.is_empty());
}

#[test]
fn mismatched_headsign_gives_empty_stops() {
    let mut query = route_15_query(ROUTE_15_LONG_NAME);
    query.headsign = Some("Ringsend Road".to_string());

    let resolution = resolver().resolve(&query).unwrap();
    assert!(resolution.stops.is_empty());
}

#[test]
fn unknown_line_gives_empty_stops() {
    let mut query = route_15_query(ROUTE_15_LONG_NAME);
    query.line = LineName::parse("999").unwrap();

    let resolution = resolver().resolve(&query).unwrap();
    assert_eq!(resolution.trip, None);
    assert!(resolution.stops.is_empty());
}

#[test]
fn arrival_not_on_trip_gives_empty_stops() {
    let mut query = route_15_query(ROUTE_15_LONG_NAME);
    query.arrival = StopDescriptor::new("Connolly, stop 7578", coords(53.3513, -6.2487));

    let resolution = resolver().resolve(&query).unwrap();
    assert!(resolution.trip.is_some());
    assert!(resolution.stops.is_empty());
}

#[test]
fn equal_arrivals_prefer_smallest_trip_id() {
    let base = dublin();
    let mut stop_times: Vec<StopTimeEntry> = Vec::new();
    let mut trips = Vec::new();
    for id in ["t15-b", "t15-a"] {
        trips.push(trip(id, "60-15-d12-1", "Clongriffin", 0));
        stop_times.extend(outbound(id, ["16:33:00", "16:35:00", "16:37:00", "16:39:00"]));
    }
    let stops: Vec<Stop> = ["8220DB000335", "8220DB000299", "8220DB000497", "8220DB000511"]
        .iter()
        .map(|id| base.stop(&StopId::parse(id).unwrap()).unwrap().clone())
        .collect();
    let schedule = InMemorySchedule::new(
        stops,
        vec![route("60-15-d12-1", "15", ROUTE_15_LONG_NAME)],
        trips,
        stop_times,
    )
    .unwrap();

    let resolution = TripResolver::new(Arc::new(schedule))
        .resolve(&route_15_query(ROUTE_15_LONG_NAME))
        .unwrap();
    assert_eq!(resolution.trip, Some(TripId::parse("t15-a").unwrap()));
}

#[test]
fn empty_schedule_store_is_an_error() {
    struct EmptyStore;

    impl ScheduleStore for EmptyStore {
        fn stop(&self, _: &StopId) -> Option<&Stop> {
            None
        }
        fn stops_named(&self, _: &str) -> Vec<&Stop> {
            Vec::new()
        }
        fn nearest_stop(&self, _: &Coordinates) -> Option<&Stop> {
            None
        }
        fn routes_by_short_name(&self, _: &LineName) -> Vec<&Route> {
            Vec::new()
        }
        fn line_names(&self) -> std::collections::BTreeSet<LineName> {
            Default::default()
        }
        fn trip(&self, _: &TripId) -> Option<&Trip> {
            None
        }
        fn trips_for_routes(&self, _: &[RouteId]) -> Vec<&Trip> {
            Vec::new()
        }
        fn stop_times_for_trip(&self, _: &TripId) -> &[StopTimeEntry] {
            &[]
        }
        fn stop_times_at_stop(&self, _: &StopId) -> Vec<&StopTimeEntry> {
            Vec::new()
        }
    }

    let err = TripResolver::new(Arc::new(EmptyStore))
        .resolve(&route_15_query(ROUTE_15_LONG_NAME))
        .unwrap_err();
    assert!(matches!(err, ResolveError::EmptySchedule));
}
