//! Identifier types for schedule records.
//!
//! GTFS identifiers are opaque strings. Wrapping them keeps a stop id from
//! being passed where a trip id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when an identifier is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: must not be empty")]
pub struct InvalidId {
    kind: &'static str,
}

macro_rules! schedule_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier, rejecting empty or all-whitespace input.
            ///
            /// Surrounding whitespace is trimmed.
            pub fn parse(s: &str) -> Result<Self, InvalidId> {
                let s = s.trim();
                if s.is_empty() {
                    return Err(InvalidId { kind: $kind });
                }
                Ok(Self(s.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

schedule_id!(
    /// A GTFS `stop_id`.
    StopId,
    "stop id"
);

schedule_id!(
    /// A GTFS `route_id`.
    RouteId,
    "route id"
);

schedule_id!(
    /// A GTFS `trip_id`.
    TripId,
    "trip id"
);

schedule_id!(
    /// A public line identifier, i.e. a route short name such as "15".
    ///
    /// This is **not** unique across routes: both directions of a line, and
    /// occasionally unrelated lines from different agencies, share one
    /// short name.
    LineName,
    "line name"
);
