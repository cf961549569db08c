use crate::graph::{Anchor, RoadNetwork};
use crate::matcher::{AlternativePath, AlternativeSearcher, Branch, Direction, MatchedSegment, WeightingStrategy};

use log::trace;

impl<N, W> AlternativeSearcher<'_, N, W>
where
    N: RoadNetwork,
    W: WeightingStrategy,
{
    /// Splices a continuation onto a clone of the branch.
    ///
    /// Points of the branch's tail which lie closer to the incoming segments
    /// are handed over to them, repeated segments are merged, and the point
    /// ranges are repaired afterwards. Returns `None` if the result does not
    /// advance past the branch's frontier or fails the validity gate.
    pub fn merge_continuation(&self, branch: &Branch, path: &AlternativePath, routed: bool) -> Option<Branch> {
        let incoming = path.segments.first()?;

        if self.is_false_uturn(branch, incoming) {
            trace!("Rejected continuation onto start segment {}", incoming.id());
            return None;
        }

        let reached = branch.frontier();
        let mut child = branch.clone();

        self.check_uturn_for_last_segment(&mut child, incoming, path.causes_uturn);

        let base = child.len();
        for segment in &path.segments {
            self.match_shortest_path_segment(&mut child, segment.clone());
        }

        let points = self.ctx.points();
        let from = base.saturating_sub(1);
        if !child.edit(|segments| points.recalculate_segment_indexes(segments, from)) {
            return None;
        }

        child.correct_directions_from(from.min(child.len().saturating_sub(1)));
        child.recount_uturns();

        if routed {
            child.record_path_search();
        }

        if child.frontier() <= reached {
            trace!("Rejected continuation, frontier {} did not pass {reached}", child.frontier());
            return None;
        }

        self.ctx.accept(child, Some(2 * path.segments.len() + 4))
    }

    /// A branch holding its start segment and one more must not continue
    /// back onto the start segment.
    fn is_false_uturn(&self, branch: &Branch, incoming: &MatchedSegment) -> bool {
        match branch.segments() {
            [start, _] => start.is_start_segment() && start.id() == incoming.id(),
            _ => false,
        }
    }

    /// Marks the last non-empty segment as reversed when the continuation
    /// turns back on it, dropping the empty segments behind it.
    ///
    /// Returns whether a reversal was found.
    pub(crate) fn check_uturn_for_last_segment(
        &self,
        branch: &mut Branch,
        incoming: &MatchedSegment,
        causes_uturn: bool,
    ) -> bool {
        let Some(position) = branch.segments().iter().rposition(|segment| !segment.is_empty()) else {
            return false;
        };

        let candidate = &branch.segments()[position];
        let attach = incoming
            .entry_node()
            .filter(|node| candidate.segment().touches(*node));

        let anchor = match (candidate.id() == incoming.id(), attach) {
            (true, _) if candidate.direction() != incoming.direction() => candidate.direction().exit(),
            (true, _) => return false,
            (false, Some(node)) if causes_uturn => candidate.segment().anchor_of(node).unwrap_or(Anchor::Center),
            _ => return false,
        };

        if anchor == Anchor::Center {
            return false;
        }

        trace!("U-turn on {} at {anchor:?}", candidate.id());

        branch.edit(|segments| {
            segments.truncate(position + 1);

            let reversed = &mut segments[position];
            reversed.flags.u_turn = true;
            reversed.direction = Direction::from_anchors(anchor, anchor);
        });

        true
    }

    /// Appends one incoming segment, merging it into the last segment when
    /// both are the same road, and re-assigning trailing points which lie
    /// closer to it otherwise.
    pub(crate) fn match_shortest_path_segment(&self, branch: &mut Branch, mut incoming: MatchedSegment) {
        let points = self.ctx.points();

        branch.edit(|segments| {
            let Some(previous) = segments.last_mut() else {
                segments.push(incoming);
                return;
            };

            if previous.id() == incoming.id() {
                let start = previous.start_index().min(incoming.start_index());
                let end = previous.end_index().max(incoming.end_index());

                previous.flags = previous.flags.union(incoming.flags());
                points.assign(previous, start, end);
                return;
            }

            if incoming.is_after_skipped_part() || incoming.start_index() != previous.end_index() {
                segments.push(incoming);
                return;
            }

            let split = points.steal_trailing(previous, incoming.segment(), 0);
            let absorbed = split == previous.start_index() && split < previous.end_index();

            if split < previous.end_index() {
                let end = incoming.end_index().max(previous.end_index());
                points.remove_diff_distances(previous, split);
                points.assign(&mut incoming, split, end);
            }

            // A fully absorbed segment is dropped when the route stays connected without it
            let removable = absorbed && !previous.is_start_segment() && !previous.is_u_turn();
            if removable && segments.len() > 1 {
                let before = &segments[segments.len() - 2];
                if before.segment().shared_node(incoming.segment(), None).is_some() {
                    segments.pop();
                }
            }

            segments.push(incoming);
        });
    }
}
