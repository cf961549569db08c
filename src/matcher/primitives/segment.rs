use crate::graph::{Anchor, NetworkSegment, NodeId, RoadClass, SegmentId};
use crate::matcher::Direction;

use either::Either;
use std::sync::Arc;

/// Match-specific markers carried by a [`MatchedSegment`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SegmentFlags {
    /// First segment of a freshly seeded branch.
    pub start_segment: bool,
    /// Inserted by a shortest-path search rather than matched directly.
    pub from_path_search: bool,
    /// The branch reverses on this segment.
    pub u_turn: bool,
    /// First segment after a part of the track which could not be matched.
    pub after_skipped_part: bool,
    /// Part of the prefix shared by every active branch.
    pub certain: bool,
}

impl SegmentFlags {
    /// Flags set on either side.
    pub fn union(self, other: SegmentFlags) -> SegmentFlags {
        SegmentFlags {
            start_segment: self.start_segment || other.start_segment,
            from_path_search: self.from_path_search || other.from_path_search,
            u_turn: self.u_turn || other.u_turn,
            after_skipped_part: self.after_skipped_part || other.after_skipped_part,
            certain: self.certain || other.certain,
        }
    }
}

/// A network segment together with the track points matched to it.
///
/// Points `start_index..end_index` of the track belong to the segment,
/// with `distances` holding the distance of each of them to its geometry.
/// Equal indices denote a segment which is only passed through.
#[derive(Debug, Clone)]
pub struct MatchedSegment {
    segment: Arc<NetworkSegment>,

    pub(crate) start_index: usize,
    pub(crate) end_index: usize,
    pub(crate) distances: Vec<f64>,

    pub(crate) direction: Direction,
    pub(crate) flags: SegmentFlags,
}

impl PartialEq for MatchedSegment {
    /// Same segment, same direction and overlapping point ranges.
    ///
    /// Ranges are half-open, so two matched ranges which only touch are
    /// disjoint. A pass-through segment overlaps any range containing or
    /// bordering its index.
    fn eq(&self, other: &Self) -> bool {
        if self.id() != other.id() || self.direction != other.direction {
            return false;
        }

        match self.is_empty() || other.is_empty() {
            true => self.start_index <= other.end_index && other.start_index <= self.end_index,
            false => self.start_index < other.end_index && other.start_index < self.end_index,
        }
    }
}

impl MatchedSegment {
    /// A segment without any points, positioned at `index`.
    pub fn new(segment: Arc<NetworkSegment>, index: usize, direction: Direction) -> Self {
        MatchedSegment {
            segment,
            start_index: index,
            end_index: index,
            distances: vec![],
            direction,
            flags: SegmentFlags::default(),
        }
    }

    /// Builder-style flag assignment.
    pub fn with_flags(mut self, flags: SegmentFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub fn id(&self) -> SegmentId {
        self.segment.id
    }

    #[inline]
    pub fn segment(&self) -> &Arc<NetworkSegment> {
        &self.segment
    }

    #[inline]
    pub fn class(&self) -> RoadClass {
        self.segment.class
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.segment.length
    }

    #[inline]
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    #[inline]
    pub fn end_index(&self) -> usize {
        self.end_index
    }

    #[inline]
    pub fn matched_points(&self) -> usize {
        self.end_index - self.start_index
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn distance_sum(&self) -> f64 {
        self.distances.iter().sum()
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn flags(&self) -> SegmentFlags {
        self.flags
    }

    #[inline]
    pub fn is_start_segment(&self) -> bool {
        self.flags.start_segment
    }

    #[inline]
    pub fn is_from_path_search(&self) -> bool {
        self.flags.from_path_search
    }

    #[inline]
    pub fn is_u_turn(&self) -> bool {
        self.flags.u_turn
    }

    #[inline]
    pub fn is_after_skipped_part(&self) -> bool {
        self.flags.after_skipped_part
    }

    #[inline]
    pub fn is_certain(&self) -> bool {
        self.flags.certain
    }

    /// The node the segment is entered through, if known.
    #[inline]
    pub fn entry_node(&self) -> Option<NodeId> {
        self.segment.node_at(self.direction.entry())
    }

    /// The node the segment is left through, if known.
    #[inline]
    pub fn exit_node(&self) -> Option<NodeId> {
        self.segment.node_at(self.direction.exit())
    }

    /// Every node the branch may continue from.
    ///
    /// An undecided exit yields both nodes the segment may legally be left through.
    pub fn exit_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        let anchors = match self.direction.exit() {
            Anchor::Center => Either::Left(
                [Anchor::End, Anchor::Start]
                    .into_iter()
                    .filter(|anchor| self.segment.one_way.allows_exit(*anchor)),
            ),
            anchor => Either::Right(std::iter::once(anchor)),
        };

        anchors.filter_map(|anchor| self.segment.node_at(anchor))
    }

    /// Identical position within a branch: segment, direction and last point.
    pub fn same_position(&self, other: &MatchedSegment) -> bool {
        self.id() == other.id()
            && self.direction == other.direction
            && self.end_index == other.end_index
    }

    /// Identical in every match-relevant field.
    pub fn same_match(&self, other: &MatchedSegment) -> bool {
        self.same_position(other) && self.start_index == other.start_index
    }
}
