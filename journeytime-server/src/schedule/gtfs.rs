//! GTFS directory loader.
//!
//! Reads the four tables the resolver needs from a GTFS feed directory into
//! an [`InMemorySchedule`]. Stop distance from the city center is computed
//! here, once, rather than per prediction.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{
    Coordinates, LineName, Route, RouteId, ScheduleTime, Stop, StopId, StopTimeEntry, Trip, TripId,
};

use super::error::ScheduleError;
use super::memory::InMemorySchedule;

#[derive(Debug, Deserialize)]
struct StopRow {
    stop_id: String,
    stop_name: String,
    stop_lat: f64,
    stop_lon: f64,
}

#[derive(Debug, Deserialize)]
struct RouteRow {
    route_id: String,
    #[serde(default)]
    agency_id: Option<String>,
    #[serde(default)]
    route_short_name: Option<String>,
    #[serde(default)]
    route_long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TripRow {
    route_id: String,
    service_id: String,
    trip_id: String,
    #[serde(default)]
    shape_id: Option<String>,
    #[serde(default)]
    trip_headsign: Option<String>,
    #[serde(default)]
    direction_id: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct StopTimeRow {
    trip_id: String,
    #[serde(default)]
    arrival_time: Option<String>,
    #[serde(default)]
    departure_time: Option<String>,
    stop_id: String,
    stop_sequence: u32,
    #[serde(default)]
    stop_headsign: Option<String>,
    #[serde(default)]
    shape_dist_traveled: Option<f64>,
}

/// Load a GTFS feed directory.
///
/// `city_center` is the reference point for each stop's
/// `dist_from_center_km`. When a trip's stop times omit
/// `shape_dist_traveled`, cumulative great-circle distance between its
/// consecutive stops is used instead.
pub fn load_gtfs_dir(
    dir: impl AsRef<Path>,
    city_center: Coordinates,
) -> Result<InMemorySchedule, ScheduleError> {
    let dir = dir.as_ref();

    let stops = read_rows::<StopRow>(dir, "stops.txt")?
        .into_iter()
        .enumerate()
        .map(|(i, row)| convert_stop(row, row_number(i), &city_center))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = stops.len(), "loaded stops");

    let routes = read_rows::<RouteRow>(dir, "routes.txt")?
        .into_iter()
        .enumerate()
        .map(|(i, row)| convert_route(row, row_number(i)))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = routes.len(), "loaded routes");

    let trips = read_rows::<TripRow>(dir, "trips.txt")?
        .into_iter()
        .enumerate()
        .map(|(i, row)| convert_trip(row, row_number(i)))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = trips.len(), "loaded trips");

    let rows = read_rows::<StopTimeRow>(dir, "stop_times.txt")?;
    let positions: HashMap<&StopId, Coordinates> =
        stops.iter().map(|s| (&s.id, s.position)).collect();
    let stop_times = convert_stop_times(rows, &positions)?;
    debug!(count = stop_times.len(), "loaded stop times");

    let schedule = InMemorySchedule::new(stops, routes, trips, stop_times)?;
    info!(
        stops = schedule.stop_count(),
        routes = schedule.route_count(),
        trips = schedule.trip_count(),
        dir = %dir.display(),
        "schedule loaded"
    );
    Ok(schedule)
}

/// 1-based row number in the file, counting the header line.
fn row_number(index: usize) -> u64 {
    index as u64 + 2
}

fn read_rows<T: serde::de::DeserializeOwned>(
    dir: &Path,
    file: &'static str,
) -> Result<Vec<T>, ScheduleError> {
    let path = dir.join(file);
    let handle = File::open(&path).map_err(|source| ScheduleError::Io {
        path: path.clone(),
        source,
    })?;

    csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(handle)
        .deserialize()
        .map(|row| row.map_err(|source| ScheduleError::Csv { file, source }))
        .collect()
}

fn invalid(file: &'static str, row: u64, message: impl ToString) -> ScheduleError {
    ScheduleError::InvalidRecord {
        file,
        row,
        message: message.to_string(),
    }
}

fn convert_stop(row: StopRow, n: u64, center: &Coordinates) -> Result<Stop, ScheduleError> {
    let id = StopId::parse(&row.stop_id).map_err(|e| invalid("stops.txt", n, e))?;
    let position =
        Coordinates::new(row.stop_lat, row.stop_lon).map_err(|e| invalid("stops.txt", n, e))?;
    Ok(Stop {
        id,
        name: row.stop_name,
        dist_from_center_km: position.distance_km(center),
        position,
    })
}

fn convert_route(row: RouteRow, n: u64) -> Result<Route, ScheduleError> {
    let id = RouteId::parse(&row.route_id).map_err(|e| invalid("routes.txt", n, e))?;
    let long_name = row.route_long_name.unwrap_or_default();

    // Some operators publish only a long name; it then doubles as the line id.
    let short = row
        .route_short_name
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| long_name.clone());
    let short_name = LineName::parse(&short).map_err(|e| invalid("routes.txt", n, e))?;

    Ok(Route {
        id,
        short_name,
        long_name,
        agency_id: row.agency_id.unwrap_or_default(),
    })
}

fn convert_trip(row: TripRow, n: u64) -> Result<Trip, ScheduleError> {
    Ok(Trip {
        id: TripId::parse(&row.trip_id).map_err(|e| invalid("trips.txt", n, e))?,
        route_id: RouteId::parse(&row.route_id).map_err(|e| invalid("trips.txt", n, e))?,
        service_id: row.service_id,
        shape_id: row.shape_id.filter(|s| !s.is_empty()),
        headsign: row.trip_headsign.unwrap_or_default(),
        direction: row.direction_id,
    })
}

fn convert_stop_times(
    rows: Vec<StopTimeRow>,
    positions: &HashMap<&StopId, Coordinates>,
) -> Result<Vec<StopTimeEntry>, ScheduleError> {
    let mut entries = Vec::with_capacity(rows.len());
    let mut missing_distance: Vec<TripId> = Vec::new();

    for (i, row) in rows.into_iter().enumerate() {
        let n = row_number(i);
        let trip_id = TripId::parse(&row.trip_id).map_err(|e| invalid("stop_times.txt", n, e))?;
        let stop_id = StopId::parse(&row.stop_id).map_err(|e| invalid("stop_times.txt", n, e))?;

        let arrival_str = row
            .arrival_time
            .filter(|s| !s.trim().is_empty())
            .or_else(|| row.departure_time.clone().filter(|s| !s.trim().is_empty()))
            .ok_or_else(|| invalid("stop_times.txt", n, "untimed stop time"))?;
        let departure_str = row
            .departure_time
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| arrival_str.clone());
        let arrival =
            ScheduleTime::parse(&arrival_str).map_err(|e| invalid("stop_times.txt", n, e))?;
        let departure =
            ScheduleTime::parse(&departure_str).map_err(|e| invalid("stop_times.txt", n, e))?;

        if row.shape_dist_traveled.is_none() {
            missing_distance.push(trip_id.clone());
        }

        entries.push(StopTimeEntry {
            trip_id,
            stop_id,
            sequence: row.stop_sequence,
            arrival,
            departure,
            headsign: row.stop_headsign.unwrap_or_default(),
            shape_dist_traveled: row.shape_dist_traveled.unwrap_or(0.0),
        });
    }

    if !missing_distance.is_empty() {
        missing_distance.sort();
        missing_distance.dedup();
        debug!(
            trips = missing_distance.len(),
            "deriving shape distance from stop positions"
        );
        derive_shape_distances(&mut entries, &missing_distance, positions);
    }

    Ok(entries)
}

/// Replace the shape distance of every entry on `trips` with the cumulative
/// great-circle distance between consecutive stops.
fn derive_shape_distances(
    entries: &mut [StopTimeEntry],
    trips: &[TripId],
    positions: &HashMap<&StopId, Coordinates>,
) {
    let mut by_trip: HashMap<&TripId, Vec<usize>> = HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        if trips.binary_search(&entry.trip_id).is_ok() {
            by_trip.entry(&entry.trip_id).or_default().push(i);
        }
    }

    let mut derived: Vec<(usize, f64)> = Vec::new();
    for mut idxs in by_trip.into_values() {
        idxs.sort_by_key(|&i| entries[i].sequence);
        let mut total = 0.0;
        let mut prev: Option<Coordinates> = None;
        for i in idxs {
            let here = positions.get(&entries[i].stop_id).copied();
            if let (Some(a), Some(b)) = (prev, here) {
                total += a.distance_m(&b);
            }
            if here.is_some() {
                prev = here;
            }
            derived.push((i, total));
        }
    }

    for (i, dist) in derived {
        entries[i].shape_dist_traveled = dist;
    }
}
