//! Stop matching: free-text name first, proximity as the fallback.

use tracing::debug;

use crate::domain::{Coordinates, Stop};
use crate::schedule::ScheduleStore;

use super::error::ResolveError;

/// How a stop description was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMatchMethod {
    /// Exactly one stop carries the asserted name.
    Name,
    /// No unique name match; the nearest stop was taken.
    Proximity,
}

/// A stop description resolved to one schedule stop.
#[derive(Debug, Clone, Copy)]
pub struct StopMatch<'a> {
    pub stop: &'a Stop,
    pub method: StopMatchMethod,
}

/// Resolve an asserted stop name and position to exactly one stop.
///
/// A unique exact name match wins. Zero or several name matches fall back
/// to the stop nearest `position` by great-circle distance.
pub fn match_stop<'a, S>(
    store: &'a S,
    name: &str,
    position: &Coordinates,
) -> Result<StopMatch<'a>, ResolveError>
where
    S: ScheduleStore + ?Sized,
{
    let named = store.stops_named(name);
    if let [stop] = named.as_slice() {
        debug!(name, stop = %stop.id, "stop matched by name");
        return Ok(StopMatch {
            stop: *stop,
            method: StopMatchMethod::Name,
        });
    }

    let stop = store
        .nearest_stop(position)
        .ok_or(ResolveError::EmptySchedule)?;
    debug!(
        name,
        name_matches = named.len(),
        stop = %stop.id,
        matched_name = %stop.name,
        "stop matched by proximity"
    );
    Ok(StopMatch {
        stop,
        method: StopMatchMethod::Proximity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopId;
    use crate::schedule::InMemorySchedule;

    fn stop(id: &str, name: &str, lat: f64, lon: f64) -> Stop {
        Stop {
            id: StopId::parse(id).unwrap(),
            name: name.to_string(),
            position: Coordinates::new(lat, lon).unwrap(),
            dist_from_center_km: 0.0,
        }
    }

    fn schedule() -> InMemorySchedule {
        InMemorySchedule::new(
            vec![
                stop("s1", "Eden Quay", 53.3482, -6.2561),
                stop("s2", "Connolly, stop 497", 53.3505, -6.2507),
                stop("s3", "Connolly, stop 7578", 53.3512, -6.2493),
                stop("s4", "Parnell Square", 53.3530, -6.2640),
                stop("s5", "Parnell Square", 53.3531, -6.2645),
            ],
            vec![],
            vec![],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn unique_name_wins_over_proximity() {
        let schedule = schedule();
        // Position is right on top of Connolly, but the name is unique.
        let here = Coordinates::new(53.3505, -6.2507).unwrap();
        let m = match_stop(&schedule, "Eden Quay", &here).unwrap();
        assert_eq!(m.stop.id.as_str(), "s1");
        assert_eq!(m.method, StopMatchMethod::Name);
    }

    #[test]
    fn unknown_name_falls_back_to_nearest() {
        let schedule = schedule();
        let here = Coordinates::new(53.3505441, -6.2507091).unwrap();
        let m = match_stop(&schedule, "Connolly", &here).unwrap();
        assert_eq!(m.stop.id.as_str(), "s2");
        assert_eq!(m.method, StopMatchMethod::Proximity);
    }

    #[test]
    fn duplicate_name_falls_back_to_nearest() {
        let schedule = schedule();
        let here = Coordinates::new(53.3531, -6.2645).unwrap();
        let m = match_stop(&schedule, "Parnell Square", &here).unwrap();
        assert_eq!(m.stop.id.as_str(), "s5");
        assert_eq!(m.method, StopMatchMethod::Proximity);
    }

    #[test]
    fn exact_coordinates_return_that_stop() {
        let schedule = schedule();
        for id in ["s1", "s2", "s3", "s4", "s5"] {
            let target = schedule.stop(&StopId::parse(id).unwrap()).unwrap();
            let m = match_stop(&schedule, "no such stop", &target.position).unwrap();
            assert_eq!(m.stop.id, target.id);
        }
    }
}
