//! Continues stalled branches beyond the reach of the network adjacency,
//! by shortest-path routing to points further ahead or by skipping the
//! unmatchable part of the track.

use crate::error::MatchError;
use crate::graph::{Anchor, NetworkSegment, RoadNetwork};
use crate::matcher::{
    AlternativePath, Branch, Direction, MatchContext, MatchedSegment, SearchCursor, SegmentFlags,
    TrackPreprocessor, WeightingStrategy,
};

use log::debug;
use std::sync::Arc;
#[cfg(feature = "tracing")]
use tracing::Level;

pub mod feasibility;
mod merge;

#[cfg(test)]
mod test;

pub use feasibility::Feasibility;

/// The kind of a proposed continuation, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Continuation {
    /// A feasible shortest path from the last segment to the target.
    Routed,
    /// Restarts on the target, leaving the points in between unmatched.
    Skipped,
    /// A shortest path failing the feasibility check.
    Fallback,
}

/// A continuation proposed for the cursor at `cursor`.
#[derive(Debug)]
struct Proposal {
    cursor: usize,
    kind: Continuation,
    path: AlternativePath,
}

/// Searches continuations for every branch of a stalled batch at once.
pub struct AlternativeSearcher<'a, N, W> {
    pub(crate) ctx: &'a MatchContext<'a, N, W>,
}

impl<'a, N, W> AlternativeSearcher<'a, N, W>
where
    N: RoadNetwork,
    W: WeightingStrategy,
{
    pub fn new(ctx: &'a MatchContext<'a, N, W>) -> Self {
        AlternativeSearcher { ctx }
    }

    /// Continues the stalled branches.
    ///
    /// Proposals are collected across the whole batch and only those of the
    /// most preferred kind which merges successfully are kept. When nothing
    /// merges, every cursor moves further along the track and the search is
    /// repeated, until the track is exhausted and the remaining branches are
    /// finished with an unmatched tail.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip_all))]
    pub fn search(&self, stalled: Vec<Branch>) -> Result<Vec<Branch>, MatchError> {
        let track_len = self.ctx.track.len();
        let mut results = Vec::new();
        let mut cursors = Vec::new();

        for mut branch in stalled {
            match branch.frontier() >= track_len {
                true => {
                    branch.finish();
                    results.push(branch);
                }
                false => cursors.push(SearchCursor {
                    next_index: branch.frontier(),
                    branch,
                }),
            }
        }

        while !cursors.is_empty() {
            self.ctx.checkpoint()?;
            self.ctx.record(|stats| stats.alternative_searches += 1);

            let mut proposals = Vec::new();
            for (index, cursor) in cursors.iter_mut().enumerate() {
                proposals.extend(self.propose(index, cursor)?);
            }

            let merged = self.merge_best(&cursors, &proposals);
            if !merged.is_empty() {
                debug!("Merged {} continuations from {} proposals", merged.len(), proposals.len());
                results.extend(merged);
                break;
            }

            cursors = cursors
                .into_iter()
                .filter_map(|mut cursor| {
                    cursor.next_index += self.advance(cursor.next_index);

                    if cursor.next_index < track_len {
                        return Some(cursor);
                    }

                    cursor.branch.finish_with_tail(track_len);
                    cursor.branch.rescore(self.ctx.weighting);
                    results.push(cursor.branch);
                    None
                })
                .collect();
        }

        Ok(results)
    }

    /// Merges the proposals of the most preferred kind which yields any
    /// branch at all.
    fn merge_best(&self, cursors: &[SearchCursor], proposals: &[Proposal]) -> Vec<Branch> {
        for kind in [Continuation::Routed, Continuation::Skipped, Continuation::Fallback] {
            let merged = proposals
                .iter()
                .filter(|proposal| proposal.kind == kind)
                .filter_map(|proposal| {
                    let branch = &cursors[proposal.cursor].branch;
                    self.merge_continuation(branch, &proposal.path, kind != Continuation::Skipped)
                })
                .collect::<Vec<_>>();

            if !merged.is_empty() {
                return merged;
            }
        }

        vec![]
    }

    /// Points to advance a cursor at `index` by: past the envelope around
    /// the point, or a single point when that would leave the track.
    fn advance(&self, index: usize) -> usize {
        let track = self.ctx.track;
        let side = self.ctx.config.envelope_side_length;

        let step = TrackPreprocessor::new(self.ctx.config)
            .next_search_point(track, index, side)
            .max(1);

        match index + step >= track.len() {
            true => 1,
            false => step,
        }
    }

    /// Proposes continuations for one cursor, moving it past points without
    /// any target nearby. Low-sampled tracks additionally probe a few points
    /// beyond the first one with targets.
    fn propose(&self, cursor: usize, search: &mut SearchCursor) -> Result<Vec<Proposal>, MatchError> {
        let config = self.ctx.config;
        let profile = self.ctx.profile;
        let track_len = self.ctx.track.len();

        let probes = match profile.low_sampling && profile.mean_interval <= config.probe_ahead_max_interval {
            true => config.probe_ahead_points,
            false => 0,
        };

        let mut proposals = Vec::new();
        let mut index = search.next_index;

        while index < track_len && proposals.is_empty() {
            proposals = self.propose_at(cursor, &search.branch, index)?;

            if proposals.is_empty() {
                index += self.advance(index);
            }
        }

        search.next_index = index.min(track_len);

        for probe in (index + 1..track_len).take(probes) {
            proposals.extend(self.propose_at(cursor, &search.branch, probe)?);
        }

        Ok(proposals)
    }

    /// Proposes continuations onto every target segment around the point at `index`.
    fn propose_at(&self, cursor: usize, branch: &Branch, index: usize) -> Result<Vec<Proposal>, MatchError> {
        let config = self.ctx.config;
        let points = self.ctx.points();

        let Some(last) = branch.last() else {
            return Ok(vec![]);
        };

        let from = branch.frontier().saturating_sub(1);
        let elapsed = self.ctx.track.elapsed(from, index);
        let feasibility = Feasibility::new(self.ctx.track, config);

        let targets = self
            .ctx
            .nearest(index, config.matching_radius, config.alternative_candidates)?;

        let mut proposals = Vec::new();

        for (target, _) in targets.iter() {
            if target.id == last.id() {
                continue;
            }

            let end = points.match_forward(target, index);
            if end == index {
                continue;
            }

            let skipped = Proposal {
                cursor,
                kind: Continuation::Skipped,
                path: self.skipped_path(target, index, end),
            };

            if elapsed >= config.max_routing_time {
                proposals.push(skipped);
                continue;
            }

            let route = self.ctx.shortest_path(last.id(), target.id)?;
            let routed = route
                .as_deref()
                .and_then(|route| self.routed_path(last, route, index, end));

            match routed {
                Some(path) if feasibility.is_feasible(last, &path, from, index) => proposals.push(Proposal {
                    cursor,
                    kind: Continuation::Routed,
                    path,
                }),
                Some(path) => {
                    proposals.push(skipped);
                    proposals.push(Proposal {
                        cursor,
                        kind: Continuation::Fallback,
                        path,
                    });
                }
                None => proposals.push(skipped),
            }
        }

        Ok(proposals)
    }

    /// A continuation restarting on `target`, which matches points `start..end`.
    fn skipped_path(&self, target: &Arc<NetworkSegment>, start: usize, end: usize) -> AlternativePath {
        let exit = match target.one_way.allows_exit(Anchor::End) {
            true => Anchor::End,
            false => Anchor::Start,
        };

        let flags = SegmentFlags {
            after_skipped_part: true,
            ..SegmentFlags::default()
        };

        let mut segment =
            MatchedSegment::new(target.clone(), start, Direction::from_anchors(Anchor::Center, exit)).with_flags(flags);
        self.ctx.points().assign(&mut segment, start, end);

        AlternativePath {
            segments: vec![segment],
            after_skipped_part: true,
            causes_uturn: false,
        }
    }

    /// The continuation along `route`, which starts on the last segment and
    /// ends on the target matching points `start..end`.
    ///
    /// Segments in between are passed through without points. Directions
    /// follow from the nodes shared along the route.
    pub(crate) fn routed_path(
        &self,
        last: &MatchedSegment,
        route: &[Arc<NetworkSegment>],
        start: usize,
        end: usize,
    ) -> Option<AlternativePath> {
        let [origin, rest @ ..] = route else {
            return None;
        };

        let (first, _) = rest.split_first()?;
        if origin.id != last.id() {
            return None;
        }

        let attach = origin.shared_node(first, last.exit_node())?;
        let causes_uturn = last.exit_node().is_some_and(|exit| exit != attach);

        let flags = SegmentFlags {
            from_path_search: true,
            ..SegmentFlags::default()
        };

        let frontier = last.end_index().min(start);
        let mut node = attach;
        let mut segments = Vec::with_capacity(rest.len());

        for (position, segment) in rest.iter().enumerate() {
            let entry = segment.anchor_of(node).unwrap_or(Anchor::Center);
            let exit = rest
                .get(position + 1)
                .and_then(|next| segment.shared_node(next, Some(segment.other_node(node))))
                .and_then(|shared| segment.anchor_of(shared))
                .unwrap_or_else(|| entry.opposite());

            let mut matched =
                MatchedSegment::new(segment.clone(), frontier, Direction::from_anchors(entry, exit)).with_flags(flags);

            if position + 1 == rest.len() {
                self.ctx.points().assign(&mut matched, start, end);
            }

            node = segment.node_at(exit).unwrap_or_else(|| segment.other_node(node));
            segments.push(matched);
        }

        Some(AlternativePath {
            segments,
            after_skipped_part: false,
            causes_uturn,
        })
    }
}
