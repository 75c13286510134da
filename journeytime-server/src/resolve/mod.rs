//! Leg resolution against the static schedule.
//!
//! A leg arrives as free text and coordinates from an external routing
//! source. Stops are matched by name, falling back to proximity; routes by
//! line number and full name, falling back to line number alone; and the
//! resulting candidate trips are narrowed to the single most probable run.

mod error;
mod route_matcher;
mod stop_matcher;
mod trip_resolver;

#[cfg(test)]
mod resolver_tests;

pub use error::ResolveError;
pub use route_matcher::{MatchConfidence, RouteMatch, match_routes};
pub use stop_matcher::{StopMatch, StopMatchMethod, match_stop};
pub use trip_resolver::{LegQuery, Resolution, StopDescriptor, TripResolver};
