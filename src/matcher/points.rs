use crate::graph::NetworkSegment;
use crate::matcher::{MatchedSegment, Track};
use crate::util::geometry::distance_to_line;

/// Assigns track points to segments.
///
/// A point matches a segment when it lies within the matching radius of
/// its geometry; consecutive matching points are claimed greedily.
#[derive(Debug, Clone, Copy)]
pub struct PointMatcher<'a> {
    track: &'a Track,
    radius: f64,
}

impl<'a> PointMatcher<'a> {
    pub fn new(track: &'a Track, radius: f64) -> Self {
        PointMatcher { track, radius }
    }

    #[inline]
    pub fn distance(&self, segment: &NetworkSegment, index: usize) -> f64 {
        distance_to_line(&self.track.point(index).position, &segment.geometry)
    }

    #[inline]
    pub fn matches(&self, segment: &NetworkSegment, index: usize) -> bool {
        self.distance(segment, index) <= self.radius
    }

    /// Index one past the last point of the consecutive run, starting at
    /// `from`, which matches the segment. Equals `from` if none does.
    pub fn match_forward(&self, segment: &NetworkSegment, from: usize) -> usize {
        (from..self.track.len())
            .find(|index| !self.matches(segment, *index))
            .unwrap_or(self.track.len())
    }

    /// Sets the point range of the segment, recomputing its distances.
    pub fn assign(&self, matched: &mut MatchedSegment, start: usize, end: usize) {
        let end = end.max(start);
        let segment = matched.segment().clone();

        matched.start_index = start;
        matched.end_index = end;
        matched.distances = (start..end)
            .map(|index| self.distance(&segment, index))
            .collect();
    }

    /// Moves the end of the segment to `end`, dropping or adding distances
    /// at the tail only.
    pub fn remove_diff_distances(&self, matched: &mut MatchedSegment, end: usize) {
        let end = end.max(matched.start_index);

        if end <= matched.end_index {
            matched.distances.truncate(end - matched.start_index);
        } else {
            let segment = matched.segment().clone();
            matched
                .distances
                .extend((matched.end_index..end).map(|index| self.distance(&segment, index)));
        }

        matched.end_index = end;
    }

    /// The index from which `next` should take over the trailing points of
    /// `previous`: every trailing point matching `next` more closely moves,
    /// while `previous` keeps at least `keep` points.
    pub fn steal_trailing(&self, previous: &MatchedSegment, next: &NetworkSegment, keep: usize) -> usize {
        let floor = (previous.start_index + keep).min(previous.end_index);
        let mut split = previous.end_index;

        while split > floor {
            let index = split - 1;
            let current = previous.distances[index - previous.start_index];
            let candidate = self.distance(next, index);

            if candidate > self.radius || candidate >= current {
                break;
            }

            split = index;
        }

        split
    }

    /// Repairs the point ranges of `segments[from..]` against their predecessors.
    ///
    /// Overlaps are resolved in favour of the earlier segment. Gaps not
    /// following a skipped part are handed out point by point to whichever
    /// neighbour lies closer. Returns whether every range is valid afterwards.
    pub fn recalculate_segment_indexes(&self, segments: &mut [MatchedSegment], from: usize) -> bool {
        for index in from.max(1)..segments.len() {
            let (head, tail) = segments.split_at_mut(index);
            let (previous, current) = (&mut head[index - 1], &mut tail[0]);

            if current.start_index < previous.end_index {
                let start = previous.end_index;
                let end = current.end_index.max(start);
                self.assign(current, start, end);
            } else if current.start_index > previous.end_index && !current.is_after_skipped_part() {
                let mut split = previous.end_index;
                let previous_segment = previous.segment().clone();
                let current_segment = current.segment().clone();

                while split < current.start_index {
                    let behind = self.distance(&previous_segment, split);
                    let ahead = self.distance(&current_segment, split);

                    if behind > self.radius || behind > ahead {
                        break;
                    }

                    split += 1;
                }

                self.remove_diff_distances(previous, split);
                let end = current.end_index;
                self.assign(current, split, end);
            }
        }

        let len = self.track.len();
        segments
            .iter()
            .all(|segment| segment.start_index <= segment.end_index && segment.end_index <= len)
    }
}
