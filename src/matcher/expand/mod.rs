use crate::error::MatchError;
use crate::graph::{Anchor, NetworkSegment, NodeId, RoadNetwork, SegmentId};
use crate::matcher::{Branch, Direction, MatchContext, MatchedSegment, WeightingStrategy};

use log::debug;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::sync::Arc;
#[cfg(feature = "tracing")]
use tracing::Level;

#[cfg(test)]
mod test;

/// Segments passed through without matching a point, each with the node it is entered by.
type PassThrough = Vec<(Arc<NetworkSegment>, NodeId)>;

/// The outcome of expanding a batch of branches.
#[derive(Debug, Default)]
pub struct Expansion {
    /// Extended clones which still have points left to match.
    pub extended: Vec<Branch>,
    /// Branches explaining the whole track.
    pub finished: Vec<Branch>,
    /// Branches no neighbouring segment could extend.
    pub stalled: Vec<Branch>,
    /// Whether any branch of the batch matched at least one point.
    pub any_matched: bool,
}

/// The outcome of expanding a single branch.
#[derive(Debug)]
pub enum BranchExpansion {
    Extended(Vec<Branch>),
    Finished(Branch),
    Stalled,
}

/// A pending lookahead path: the segments passed through so far and the
/// node the search continues from.
struct PendingPath {
    through: PassThrough,
    from: SegmentId,
    exit: NodeId,
    length: f64,
}

/// Extends branches along the network adjacency of their last segment.
pub struct DirectExpander<'a, N, W> {
    ctx: &'a MatchContext<'a, N, W>,
}

impl<'a, N, W> DirectExpander<'a, N, W>
where
    N: RoadNetwork,
    W: WeightingStrategy,
{
    pub fn new(ctx: &'a MatchContext<'a, N, W>) -> Self {
        DirectExpander { ctx }
    }

    /// Expands every branch of the batch by one step.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip_all))]
    pub fn expand(&self, branches: Vec<Branch>) -> Result<Expansion, MatchError> {
        let mut expansion = Expansion::default();

        for branch in branches {
            self.ctx.checkpoint()?;
            expansion.any_matched |= branch.matched_points() > 0;

            match self.expand_branch(&branch)? {
                BranchExpansion::Extended(children) => {
                    for child in children {
                        match child.is_finished() {
                            true => expansion.finished.push(child),
                            false => expansion.extended.push(child),
                        }
                    }
                }
                BranchExpansion::Finished(done) => expansion.finished.push(done),
                BranchExpansion::Stalled => expansion.stalled.push(branch),
            }
        }

        debug!(
            "Expanded into {} branches, {} finished, {} stalled",
            expansion.extended.len(),
            expansion.finished.len(),
            expansion.stalled.len()
        );

        Ok(expansion)
    }

    /// Extends a single branch by the neighbours of its last segment.
    ///
    /// Dense points are followed through several hops at once, otherwise
    /// only direct successors are tried, followed by a retry from earlier
    /// points and, on motorways, a walk along the unique successor chain.
    pub fn expand_branch(&self, branch: &Branch) -> Result<BranchExpansion, MatchError> {
        let track = self.ctx.track;
        let config = self.ctx.config;
        let frontier = branch.frontier();

        if branch.is_finished() || frontier >= track.len() {
            let mut done = branch.clone();
            done.finish();
            return Ok(BranchExpansion::Finished(done));
        }

        let Some(last) = branch.last() else {
            return Ok(BranchExpansion::Stalled);
        };

        let exits = last.exit_nodes().collect::<SmallVec<[NodeId; 2]>>();
        let gap = match frontier {
            0 => f64::INFINITY,
            _ => track.distance(frontier - 1, frontier),
        };

        let mut children = Vec::new();
        if config.extended_path_matching && gap < config.extended_matching_distance {
            children = self.lookahead(branch, last, &exits, gap)?;
        }

        if children.is_empty() {
            children = self.single_hop(branch, last, &exits)?;
        }

        Ok(match children.is_empty() {
            true => BranchExpansion::Stalled,
            false => BranchExpansion::Extended(children),
        })
    }

    /// Re-resolves the directions of the last two segments of every branch,
    /// now that their successors are known.
    pub fn correct_segment_directions(&self, branches: &mut [Branch]) {
        for branch in branches {
            branch.correct_directions_from(branch.len().saturating_sub(2));
        }
    }

    /// Depth-first search over up to `max_lookahead_depth` hops for the
    /// first segment on each path which matches the next point.
    fn lookahead(
        &self,
        branch: &Branch,
        last: &MatchedSegment,
        exits: &[NodeId],
        gap: f64,
    ) -> Result<Vec<Branch>, MatchError> {
        let config = self.ctx.config;
        let points = self.ctx.points();
        let frontier = branch.frontier();

        let visited = branch
            .segments()
            .iter()
            .chain(&branch.certain_end)
            .map(MatchedSegment::id)
            .collect::<FxHashSet<_>>();

        let passthrough_cap = config.max_passthrough_length.min(1.5 * gap);

        let mut stack = exits
            .iter()
            .map(|&exit| PendingPath {
                through: vec![],
                from: last.id(),
                exit,
                length: 0.0,
            })
            .collect::<Vec<_>>();

        let mut children = Vec::new();

        while let Some(pending) = stack.pop() {
            for next in self.ctx.adjacent(pending.from, pending.exit)? {
                if visited.contains(&next.id) || pending.through.iter().any(|(s, _)| s.id == next.id) {
                    continue;
                }

                let end = points.match_forward(&next, frontier);
                if end > frontier {
                    let child = self.extend_with(branch, &pending.through, &next, pending.exit, frontier, end);
                    children.extend(child);
                    continue;
                }

                let length = pending.length + next.length;
                if pending.through.len() + 2 <= config.max_lookahead_depth && length < passthrough_cap {
                    let mut through = pending.through.clone();
                    through.push((next.clone(), pending.exit));

                    stack.push(PendingPath {
                        through,
                        from: next.id,
                        exit: next.other_node(pending.exit),
                        length,
                    });
                }
            }
        }

        Ok(children)
    }

    fn single_hop(
        &self,
        branch: &Branch,
        last: &MatchedSegment,
        exits: &[NodeId],
    ) -> Result<Vec<Branch>, MatchError> {
        let points = self.ctx.points();
        let frontier = branch.frontier();
        let mut children = Vec::new();

        for &exit in exits {
            for next in self.ctx.adjacent(last.id(), exit)? {
                if next.id == last.id() {
                    continue;
                }

                let end = points.match_forward(&next, frontier);
                if end > frontier {
                    children.extend(self.extend_with(branch, &[], &next, exit, frontier, end));
                    continue;
                }

                if let Some(child) = self.retry_earlier(branch, last, &next, exit) {
                    children.push(child);
                    continue;
                }

                if next.class.is_motorway() {
                    children.extend(self.follow_motorway(branch, &next, exit)?);
                }
            }
        }

        Ok(children)
    }

    /// Hands points already consumed by the last segment over to a successor
    /// which matches them, walking back no further than the successor's
    /// length from the frontier point. The last segment keeps at least one
    /// point.
    fn retry_earlier(
        &self,
        branch: &Branch,
        last: &MatchedSegment,
        next: &Arc<NetworkSegment>,
        exit: NodeId,
    ) -> Option<Branch> {
        let track = self.ctx.track;
        let points = self.ctx.points();
        let frontier = branch.frontier();
        let floor = last.start_index() + 1;

        let mut index = frontier;
        while index > floor {
            let earlier = index - 1;
            if track.distance(earlier, frontier) > next.length {
                break;
            }

            let end = points.match_forward(next, earlier);
            if end > earlier {
                return self.extend_with(branch, &[], next, exit, earlier, end);
            }

            index = earlier;
        }

        None
    }

    /// Walks the chain of unique successors beyond a motorway segment
    /// which did not match, until one does, the road forks or ends.
    fn follow_motorway(
        &self,
        branch: &Branch,
        next: &Arc<NetworkSegment>,
        exit: NodeId,
    ) -> Result<Option<Branch>, MatchError> {
        let points = self.ctx.points();
        let frontier = branch.frontier();

        let mut through: PassThrough = vec![(next.clone(), exit)];
        let mut current = next.clone();
        let mut node = next.other_node(exit);

        for _ in 0..self.ctx.config.max_motorway_chain {
            let successors = self
                .ctx
                .adjacent(current.id, node)?
                .into_iter()
                .filter(|successor| successor.id != current.id)
                .collect::<Vec<_>>();

            let [successor] = successors.as_slice() else {
                break;
            };

            let end = points.match_forward(successor, frontier);
            if end > frontier {
                return Ok(self.extend_with(branch, &through, successor, node, frontier, end));
            }

            through.push((successor.clone(), node));
            node = successor.other_node(node);
            current = successor.clone();
        }

        Ok(None)
    }

    /// A clone of the branch, continued over the pass-through segments onto
    /// `next`, which matches points `start..end`. Trailing points of the last
    /// segment lying closer to a direct successor are handed over to it.
    fn extend_with(
        &self,
        branch: &Branch,
        through: &[(Arc<NetworkSegment>, NodeId)],
        next: &Arc<NetworkSegment>,
        entry: NodeId,
        start: usize,
        end: usize,
    ) -> Option<Branch> {
        let points = self.ctx.points();
        let frontier = branch.frontier();

        let mut child = branch.clone();
        let base = child.len();

        child.edit(|segments| {
            let mut from = start;

            if let Some(last) = segments.last_mut() {
                if start < frontier {
                    points.remove_diff_distances(last, start);
                } else if through.is_empty() {
                    from = points.steal_trailing(last, next, 1);
                    points.remove_diff_distances(last, from);
                }
            }

            for (segment, node) in through {
                let anchor = segment.anchor_of(*node).unwrap_or(Anchor::Center);
                let direction = Direction::from_anchors(anchor, anchor.opposite());
                segments.push(MatchedSegment::new(segment.clone(), from, direction));
            }

            let anchor = next.anchor_of(entry).unwrap_or(Anchor::Center);
            let mut matched =
                MatchedSegment::new(next.clone(), from, Direction::from_anchors(anchor, anchor.opposite()));
            points.assign(&mut matched, from, end);
            segments.push(matched);
        });

        child.correct_directions_from(base.saturating_sub(1));

        let added = child.len() - base;
        self.ctx.accept(child, Some(2 * added + 4))
    }
}
