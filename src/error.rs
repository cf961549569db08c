use crate::graph::SegmentId;
use thiserror::Error;

/// Failures raised by a [`RoadNetwork`](crate::graph::RoadNetwork) backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("road network graph `{0}` could not be found")]
    GraphNotFound(String),

    #[error("segment {0} does not exist in the road network")]
    SegmentNotFound(SegmentId),
}

/// Errors surfaced by a [`MatchOrchestrator`](crate::matcher::MatchOrchestrator).
///
/// Local dead ends (no path, infeasible candidates, out-of-bounds tracks) are
/// never errors; they degrade into fewer or empty results instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("matching was cancelled")]
    Cancelled,

    #[error("road network failure: {0}")]
    Network(#[from] NetworkError),
}
