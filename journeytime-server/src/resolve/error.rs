//! Resolution error types.

/// Errors raised while resolving a leg against the schedule.
///
/// Failing to find a trip is not an error; it yields an empty stop list.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The schedule holds no stops, so proximity matching has nothing to
    /// fall back on
    #[error("schedule contains no stops")]
    EmptySchedule,
}
