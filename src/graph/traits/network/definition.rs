use crate::error::NetworkError;
use crate::graph::{NetworkSegment, NodeId, SegmentId};

use geo::{Point, Rect};
use std::sync::Arc;

/// The road network a track is matched against.
///
/// Implementations own the segments and hand them out as shared,
/// read-only [`NetworkSegment`]s. All queries are synchronous; the
/// matcher checks for cancellation before every call.
pub trait RoadNetwork {
    /// Segments whose geometry lies within `radius` meters of the point,
    /// paired with that distance.
    ///
    /// At most `max_count` entries are returned. No ordering is required,
    /// the matcher sorts the candidates itself.
    fn nearest_segments(
        &self,
        point: &Point,
        radius: f64,
        max_count: usize,
    ) -> Result<Vec<(SegmentId, f64)>, NetworkError>;

    /// Resolves a segment by its identifier.
    fn segment(&self, id: SegmentId) -> Result<Arc<NetworkSegment>, NetworkError>;

    /// Segments which can be entered at `exit` after leaving segment `id` through it.
    ///
    /// One-way restrictions of the neighbours are honoured and the segment
    /// itself is never part of the result.
    fn adjacent_segments(
        &self,
        id: SegmentId,
        exit: NodeId,
    ) -> Result<Vec<Arc<NetworkSegment>>, NetworkError>;

    /// The cheapest traversable sequence of segments from `from` to `to`,
    /// including both, using at most `max_hops` transitions.
    ///
    /// `Ok(None)` signals that no such path exists within the hop budget.
    fn shortest_path(
        &self,
        from: SegmentId,
        to: SegmentId,
        max_hops: usize,
    ) -> Result<Option<Vec<Arc<NetworkSegment>>>, NetworkError>;

    /// Bounding rectangle of every segment in the network, `None` if it is empty.
    fn covered_area(&self) -> Option<Rect>;
}

impl<N> RoadNetwork for &N
where
    N: RoadNetwork + ?Sized,
{
    fn nearest_segments(
        &self,
        point: &Point,
        radius: f64,
        max_count: usize,
    ) -> Result<Vec<(SegmentId, f64)>, NetworkError> {
        (**self).nearest_segments(point, radius, max_count)
    }

    fn segment(&self, id: SegmentId) -> Result<Arc<NetworkSegment>, NetworkError> {
        (**self).segment(id)
    }

    fn adjacent_segments(
        &self,
        id: SegmentId,
        exit: NodeId,
    ) -> Result<Vec<Arc<NetworkSegment>>, NetworkError> {
        (**self).adjacent_segments(id, exit)
    }

    fn shortest_path(
        &self,
        from: SegmentId,
        to: SegmentId,
        max_hops: usize,
    ) -> Result<Option<Vec<Arc<NetworkSegment>>>, NetworkError> {
        (**self).shortest_path(from, to, max_hops)
    }

    fn covered_area(&self) -> Option<Rect> {
        (**self).covered_area()
    }
}
