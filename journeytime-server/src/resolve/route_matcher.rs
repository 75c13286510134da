//! Route matching by public line identifier.

use tracing::debug;

use crate::domain::{LineName, RouteId};
use crate::schedule::ScheduleStore;

/// How confidently a line description was matched to routes.
///
/// Ordered so that more confident matches sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchConfidence {
    /// Short name and long name both matched. Direction is implied by the
    /// route ids.
    Exact,
    /// Only the short name matched. The candidate routes may include both
    /// directions of a line, or unrelated lines sharing the identifier.
    ShortNameOnly,
}

impl MatchConfidence {
    /// Human-readable description of the confidence level.
    pub fn description(&self) -> &'static str {
        match self {
            MatchConfidence::Exact => "Matches line number and full name",
            MatchConfidence::ShortNameOnly => "Matches line number only",
        }
    }
}

/// Candidate routes for a line description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Matching route ids, in route id order. May be empty.
    pub routes: Vec<RouteId>,
    pub confidence: MatchConfidence,
}

impl RouteMatch {
    /// True when direction still has to be established from stop order.
    pub fn is_ambiguous(&self) -> bool {
        self.confidence == MatchConfidence::ShortNameOnly
    }
}

/// Find the routes a line description refers to.
///
/// Routes matching both `short_name` and `long_name` exactly are an exact
/// match. Otherwise every route with `short_name` is returned, flagged as
/// ambiguous.
pub fn match_routes<S>(store: &S, short_name: &LineName, long_name: Option<&str>) -> RouteMatch
where
    S: ScheduleStore + ?Sized,
{
    let by_short = store.routes_by_short_name(short_name);

    if let Some(long_name) = long_name {
        let exact: Vec<RouteId> = by_short
            .iter()
            .filter(|r| r.long_name == long_name)
            .map(|r| r.id.clone())
            .collect();
        if !exact.is_empty() {
            debug!(line = %short_name, routes = exact.len(), "routes matched exactly");
            return RouteMatch {
                routes: exact,
                confidence: MatchConfidence::Exact,
            };
        }
    }

    let routes: Vec<RouteId> = by_short.iter().map(|r| r.id.clone()).collect();
    debug!(
        line = %short_name,
        routes = routes.len(),
        "routes matched by line number only"
    );
    RouteMatch {
        routes,
        confidence: MatchConfidence::ShortNameOnly,
    }
}
