//! Shared test fixtures: a small slice of Dublin route 15.
//!
//! Four stops along the quays, two route variants sharing the short name
//! `15` (one per direction), and an unrelated line `16` with no trips.
//! Also a model directory holding a pass-through generic model and,
//! optionally, a flat end-to-end model for line `15`.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use crate::catalog::Catalog;
use crate::domain::{
    Coordinates, LineName, Route, RouteId, ScheduleTime, Stop, StopId, StopTimeEntry, Trip, TripId,
};
use crate::inference::{END_TO_END_DIR, ModelConfig, ModelRegistry, STOP_TO_STOP_DIR};
use crate::predict::{LegPredictor, PredictionEngine};
use crate::resolve::TripResolver;
use crate::schedule::{InMemorySchedule, ScheduleStore};
use crate::weather::WeatherSource;

pub(crate) const ROUTE_15_LONG_NAME: &str = "Main Street - Ballycullen Road (Hunter's Avenue)";

pub(crate) fn coords(lat: f64, lon: f64) -> Coordinates {
    Coordinates::new(lat, lon).unwrap()
}

pub(crate) fn stop(id: &str, name: &str, lat: f64, lon: f64) -> Stop {
    Stop {
        id: StopId::parse(id).unwrap(),
        name: name.to_string(),
        position: coords(lat, lon),
        dist_from_center_km: 0.3,
    }
}

pub(crate) fn route(id: &str, short: &str, long: &str) -> Route {
    Route {
        id: RouteId::parse(id).unwrap(),
        short_name: LineName::parse(short).unwrap(),
        long_name: long.to_string(),
        agency_id: "978".to_string(),
    }
}

pub(crate) fn trip(id: &str, route: &str, headsign: &str, direction: u8) -> Trip {
    Trip {
        id: TripId::parse(id).unwrap(),
        route_id: RouteId::parse(route).unwrap(),
        service_id: "y102k".to_string(),
        shape_id: Some(format!("{route}-shape")),
        headsign: headsign.to_string(),
        direction: Some(direction),
    }
}

/// Stop times for one trip: (stop id, arrival, shape distance), with the
/// given per-visit headsign.
pub(crate) fn visits(trip: &str, headsign: &str, calls: &[(&str, &str, f64)]) -> Vec<StopTimeEntry> {
    calls
        .iter()
        .enumerate()
        .map(|(i, (stop, arrival, dist))| {
            let t = ScheduleTime::parse(arrival).unwrap();
            StopTimeEntry {
                trip_id: TripId::parse(trip).unwrap(),
                stop_id: StopId::parse(stop).unwrap(),
                sequence: i as u32 + 1,
                arrival: t,
                departure: t,
                headsign: headsign.to_string(),
                shape_dist_traveled: *dist,
            }
        })
        .collect()
}

pub(crate) fn outbound(trip: &str, times: [&str; 4]) -> Vec<StopTimeEntry> {
    // The GTFS feed carries a leading space on per-visit headsigns.
    visits(
        trip,
        " Clongriffin",
        &[
            ("8220DB000335", times[0], 0.0),
            ("8220DB000299", times[1], 350.0),
            ("8220DB000497", times[2], 800.0),
            ("8220DB000511", times[3], 1200.0),
        ],
    )
}

pub(crate) fn inbound(trip: &str, times: [&str; 4]) -> Vec<StopTimeEntry> {
    visits(
        trip,
        " Ballycullen Road",
        &[
            ("8220DB000511", times[0], 0.0),
            ("8220DB000497", times[1], 400.0),
            ("8220DB000299", times[2], 850.0),
            ("8220DB000335", times[3], 1200.0),
        ],
    )
}

pub(crate) fn dublin() -> InMemorySchedule {
    let stops = vec![
        stop("8220DB000335", "Aston Quay, stop 335", 53.3469, -6.2597),
        stop("8220DB000299", "Eden Quay, stop 299", 53.3482354, -6.2561569),
        stop("8220DB000497", "Connolly, stop 497", 53.3505, -6.2507),
        stop("8220DB007578", "Connolly, stop 7578", 53.3513, -6.2487),
        stop("8220DB000511", "Amiens Street, stop 511", 53.3531, -6.2485),
    ];
    let routes = vec![
        route("60-15-d12-1", "15", ROUTE_15_LONG_NAME),
        route("60-15-d12-2", "15", "Clongriffin - Ballycullen Road"),
        route("60-16-d12-1", "16", "Ballinteer - Dublin Airport"),
    ];
    let trips = vec![
        trip("t15-out-0830", "60-15-d12-1", "Clongriffin", 0),
        trip("t15-out-1635", "60-15-d12-1", "Clongriffin", 0),
        trip("t15-out-1650", "60-15-d12-1", "Clongriffin", 0),
        trip("t15-in-1636", "60-15-d12-2", "Ballycullen Road", 1),
    ];
    let mut stop_times = Vec::new();
    stop_times.extend(outbound(
        "t15-out-0830",
        ["08:28:00", "08:30:00", "08:32:00", "08:34:00"],
    ));
    stop_times.extend(outbound(
        "t15-out-1635",
        ["16:33:00", "16:35:00", "16:37:00", "16:39:00"],
    ));
    stop_times.extend(outbound(
        "t15-out-1650",
        ["16:48:00", "16:50:00", "16:52:00", "16:54:00"],
    ));
    // Reaches Eden Quay later than the outbound 16:35, but in the wrong
    // direction.
    stop_times.extend(inbound(
        "t15-in-1636",
        ["16:36:00", "16:38:00", "16:41:00", "16:43:00"],
    ));

    InMemorySchedule::new(stops, routes, trips, stop_times).unwrap()
}

/// Generic model that returns the planned share it is given.
pub(crate) const PASS_THROUGH_MODEL: &str = r#"{
    "features": ["PLANNED_JOURNEY_TIME", "dis_twostop", "dis_prestop_city",
                 "dis_stopnow_city", "temp", "week_sin", "week_cos",
                 "hour_sin", "hour_cos"],
    "model": {"kind": "linear", "intercept": 0.0,
              "coefficients": [1.0, 0, 0, 0, 0, 0, 0, 0, 0]}
}"#;

/// Line model predicting a flat 15 minutes.
pub(crate) const FLAT_LINE_MODEL: &str = r#"{
    "features": ["PLANNED_JOURNEY_TIME", "week_sin", "week_cos", "hour_sin",
                 "hour_cos", "month_sin", "month_cos", "temp"],
    "model": {"kind": "forest", "trees": [{"nodes": [{"type": "leaf", "value": 900.0}]}]}
}"#;

pub(crate) fn model_root(with_line_model: bool) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let s2s = dir.path().join(STOP_TO_STOP_DIR);
    fs::create_dir_all(&s2s).unwrap();
    fs::write(s2s.join("stop_to_stop.json"), PASS_THROUGH_MODEL).unwrap();
    if with_line_model {
        let e2e = dir.path().join(END_TO_END_DIR);
        fs::create_dir_all(&e2e).unwrap();
        fs::write(e2e.join("15.json"), FLAT_LINE_MODEL).unwrap();
    }
    dir
}

/// A predictor over [`dublin`] and the models under `root`.
pub(crate) fn leg_predictor<W: WeatherSource>(root: &TempDir, weather: W) -> LegPredictor<W> {
    let schedule: Arc<dyn ScheduleStore> = Arc::new(dublin());
    let models = Arc::new(ModelRegistry::open(&ModelConfig::new(root.path())).unwrap());
    let catalog = Catalog::build(Arc::clone(&schedule), Arc::clone(&models)).unwrap();
    LegPredictor::new(
        TripResolver::new(schedule),
        PredictionEngine::new(models),
        catalog,
        Arc::new(weather),
        283.15,
    )
}
