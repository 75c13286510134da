//! Geographic coordinates and great-circle distance.

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};

/// Error returned for out-of-range coordinates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinates ({lat}, {lon}): {reason}")]
pub struct InvalidCoordinates {
    lat: f64,
    lon: f64,
    reason: &'static str,
}

/// A WGS84 latitude/longitude pair, in degrees.
///
/// Construction rejects NaN and out-of-range values, so distance
/// calculations never see garbage input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    /// O'Connell Bridge, Dublin.
    pub const DUBLIN_CITY_CENTER: Coordinates = Coordinates {
        lat: 53.347269,
        lon: -6.259107,
    };

    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinates> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(InvalidCoordinates {
                lat,
                lon,
                reason: "must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoordinates {
                lat,
                lon,
                reason: "latitude must be within [-90, 90]",
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidCoordinates {
                lat,
                lon,
                reason: "longitude must be within [-180, 180]",
            });
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// As a `geo` point (x = longitude, y = latitude).
    pub fn point(&self) -> Point {
        Point::new(self.lon, self.lat)
    }

    /// Position on the unit sphere.
    ///
    /// Straight-line distance between two of these grows monotonically with
    /// great-circle distance, which is what lets a Euclidean spatial index
    /// answer great-circle nearest-neighbour queries.
    pub fn unit_vector(&self) -> [f64; 3] {
        let (lat, lon) = (self.lat.to_radians(), self.lon.to_radians());
        [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
    }

    /// Great-circle distance to `other` in metres (haversine on a sphere).
    ///
    /// Planar distance on raw degrees is wrong at Dublin's latitude, where a
    /// degree of longitude is ~40% shorter than a degree of latitude.
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        self.point().haversine_distance(&other.point())
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        self.distance_m(other) / 1000.0
    }
}
